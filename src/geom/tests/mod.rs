mod support;
mod test_octree_basic;

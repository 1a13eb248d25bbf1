pub mod artifact;
pub mod extraction;
pub mod storage;

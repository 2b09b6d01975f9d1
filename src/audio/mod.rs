pub mod block;
pub mod decode;

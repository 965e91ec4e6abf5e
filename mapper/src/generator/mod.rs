pub mod chirp;
pub mod scenario;

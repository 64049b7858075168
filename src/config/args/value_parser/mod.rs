pub mod file_exist;
pub mod storage_path;
pub mod url;

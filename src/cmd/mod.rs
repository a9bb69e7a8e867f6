mod download;

pub use download::cmd_download;

pub mod nm3u8dl;

pub use nm3u8dl::NM3u8DlBackend;

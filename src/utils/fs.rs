use crate::utils::log::pack_error_and_exit;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub fn pack_read<P: AsRef<Path>>(path: P, msg: impl AsRef<str>) -> fs::File {
    match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => pack_error_and_exit(format!("{}: {}", msg.as_ref(), e)),
    }
}

pub fn pack_create_file<P: AsRef<Path>>(path: P, msg: impl AsRef<str>) -> fs::File {
    match fs::File::create(path) {
        Ok(file) => file,
        Err(e) => pack_error_and_exit(format!("{}: {}", msg.as_ref(), e)),
    }
}

pub fn pack_write(mut file: File, buf: &[u8], msg: impl AsRef<str>) -> usize {
    file.write(buf)
        .unwrap_or_else(|e| pack_error_and_exit(format!("{}: {}", msg.as_ref(), e)))
}

#[cfg(not(target_arch = "wasm32"))]
use memmap::Mmap;
use std::error::Error;
use std::fmt::Display;
#[cfg(not(target_arch = "wasm32"))]
use std::fs::File;
use wasm_bindgen::JsValue;

/// File extension every controller code source has to use
pub const EXTENSION: &str = "coco";

#[derive(Debug)]
#[allow(unused)]
pub(crate) enum SourceErrorKind {
    FileOpenError(String, Box<dyn Error>),
    MemoryMapError(String, Box<dyn Error>),
    EncodingError(String),
}

impl SourceErrorKind {
    #[allow(unused)]
    fn throw<T>(self) -> Result<T, SourceError> {
        let msg = match &self {
            SourceErrorKind::FileOpenError(file_name, err) => {
                format!("the supplied file `{}` could not be opened, details: {}", file_name, err)
            }
            SourceErrorKind::MemoryMapError(file_name, err) => {
                format!("failed to memory map `{}`, details: {}", file_name, err)
            }
            SourceErrorKind::EncodingError(file_name) => {
                format!("`{}` is not valid utf-8", file_name)
            }
        };
        Err(SourceError { msg, kind: self })
    }
}

impl Display for SourceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct SourceError {
    msg: String,
    kind: SourceErrorKind,
}

impl Error for SourceError {}

impl Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file error: {}", self.msg)
    }
}

impl Into<JsValue> for SourceError {
    fn into(self) -> JsValue {
        JsValue::from(format!("coco error occurred: {}", self))
    }
}

/// Splits raw source into upper-cased lines, controller code is case-insensitive
pub fn lines(source: &str) -> Vec<String> {
    source.lines().map(|line| line.to_uppercase()).collect()
}

/// Reads a controller code file from disk, one upper-cased entry per line
#[cfg(not(target_arch = "wasm32"))]
pub fn read(file_name: &str) -> Result<Vec<String>, SourceError> {
    let file = match File::open(file_name) {
        Ok(content) => content,
        Err(err) => {
            return SourceErrorKind::FileOpenError(file_name.to_string(), Box::new(err)).throw()
        }
    };
    let len = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(err) => {
            return SourceErrorKind::FileOpenError(file_name.to_string(), Box::new(err)).throw()
        }
    };
    // zero length mappings are rejected by the os
    if len == 0 {
        return Ok(vec![]);
    }
    let source = unsafe {
        match Mmap::map(&file) {
            Ok(content) => content,
            Err(err) => {
                return SourceErrorKind::MemoryMapError(file_name.to_string(), Box::new(err))
                    .throw()
            }
        }
    };
    match std::str::from_utf8(&source) {
        Ok(text) => Ok(lines(text)),
        Err(_) => SourceErrorKind::EncodingError(file_name.to_string()).throw(),
    }
}

/// Whether the path carries the controller code extension
pub fn has_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .map_or(false, |ext| ext == EXTENSION)
}

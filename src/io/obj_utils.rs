// Copyright @yucwang 2023

use std::fmt;
use std::fs;
use std::path::Path;

use wavefront_obj::{obj, ParseError};

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::Parse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::Parse(err) => write!(f, "obj parse error: {}", err),
        }
    }
}

impl std::error::Error for ObjLoadError {}

/// Parses OBJ text; polygons with more than three corners become fans.
pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<obj::ObjSet, ParseError> {
    obj::parse(fan_triangulate(input.as_ref()))
}

pub fn load_obj_from_file<P: AsRef<Path>>(path: P) -> Result<obj::ObjSet, ObjLoadError> {
    log::info!("Loading mesh: {}.", path.as_ref().display());
    let data = fs::read_to_string(path)?;
    Ok(load_obj_from_str(data)?)
}

fn fan_triangulate(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some("f") {
            let corners: Vec<&str> = tokens.take_while(|t| !t.starts_with('#')).collect();
            if corners.len() > 3 {
                for pair in corners[1..].windows(2) {
                    out.push_str(&format!("f {} {} {}\n", corners[0], pair[0], pair[1]));
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

//! Reading command input from files or stdin.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

/// Reads `path` to a string; `-` reads stdin.
pub fn read_input(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        Ok(contents)
    } else {
        fs::read_to_string(path)
    }
}

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// Name under which standard input is reported in diagnostics.
const STDIN_NAME: &str = "-";

/// Errors that can occur while opening or reading an input source.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to read from '{path}': {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
}

/// Normalizes the positional arguments into the ordered source list.
///
/// An empty list means standard input; `-` names standard input and may
/// be interleaved with file names and repeated.
pub(crate) fn source_names(arguments: &[String]) -> Vec<String> {
    if arguments.is_empty() {
        vec![STDIN_NAME.to_string()]
    } else {
        arguments.to_vec()
    }
}

/// One input source, read line by line with bytes preserved.
///
/// Sources are opened one at a time as the run reaches them, so a bad
/// file name late in the list does not suppress output already produced
/// for earlier sources.
pub(crate) struct LineSource {
    name: PathBuf,
    reader: Box<dyn BufRead>,
}

impl std::fmt::Debug for LineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl LineSource {
    pub(crate) fn open(argument: &str) -> Result<Self, InputError> {
        if argument == STDIN_NAME {
            return Ok(Self {
                name: PathBuf::from(STDIN_NAME),
                reader: Box::new(BufReader::new(io::stdin())),
            });
        }
        let path = PathBuf::from(argument);
        let file = File::open(&path).map_err(|source| InputError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            name: path,
            reader: Box::new(BufReader::new(file)),
        })
    }

    /// Reads the next line into `line`, including its trailing newline.
    ///
    /// Returns `Ok(false)` at end of input. The final line of a source
    /// may arrive without a newline terminator.
    pub(crate) fn next_line(&mut self, line: &mut Vec<u8>) -> Result<bool, InputError> {
        line.clear();
        let read = self
            .reader
            .read_until(b'\n', line)
            .map_err(|source| InputError::Read {
                path: self.name.clone(),
                source,
            })?;
        Ok(read > 0)
    }
}

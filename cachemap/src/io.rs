use std::fs::File;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // An optional binary address, optionally followed by a comment
    static ref TRACE_LINE: Regex = Regex::new(r"^\s*(?P<address>[01]+)?\s*(?:#.*)?$").unwrap();
}

/// Reads an address trace file: one binary address per line, blank lines and `#` comments allowed
///
/// Only the characters are checked here. Lengths are checked against the cache when each address
/// is simulated
pub fn read_address_trace(file: File) -> Result<Vec<String>, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::{BufReader, Read};
        let mut text = String::new();
        BufReader::new(file).read_to_string(&mut text).map_err(|e| format!("Couldn't read the trace file: {e}"))?;
        parse_address_trace(&text)
    }
    // Memory map the file on unix systems
    #[cfg(unix)]
    {
        use memmap2::{Advice, Mmap};
        let length = file.metadata().map_err(|e| format!("Couldn't read the trace file metadata: {e}"))?.len();
        // Mapping an empty file fails on some systems
        if length == 0 {
            return Ok(Vec::new());
        }
        let m = unsafe { Mmap::map(&file) }.map_err(|e| format!("Couldn't memory map the file: {e}"))?;
        m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
        let text = std::str::from_utf8(&m).map_err(|e| format!("The trace file isn't valid UTF-8: {e}"))?;
        parse_address_trace(text)
    }
}

/// Parses the text of an address trace. The error names the first line which isn't an address
///
/// # Examples
///
/// ```
/// use cachemap::io::parse_address_trace;
/// let addresses = parse_address_trace("# warm up\n10110110\n\n  00000100  # conflict\n").unwrap();
/// assert_eq!(addresses, vec!["10110110", "00000100"]);
/// ```
pub fn parse_address_trace(text: &str) -> Result<Vec<String>, String> {
    let mut addresses = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let captures = TRACE_LINE
            .captures(line)
            .ok_or_else(|| format!("Line {} of the trace isn't a binary address: {line:?}", number + 1))?;
        if let Some(address) = captures.name("address") {
            addresses.push(address.as_str().to_string());
        }
    }
    Ok(addresses)
}

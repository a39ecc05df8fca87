use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use byte_parser::{StrParser, ParseIterator};

/// Reads the file into `s` reusing its allocation.
pub fn read_to_string_mut(path: impl AsRef<Path>, s: &mut String) -> io::Result<()> {
	s.clear();
	let mut file = File::open(path)?;
	file.read_to_string(s)?;
	Ok(())
}

/// Parses a whole token as an unsigned integer.
/// Returns None if the token contains anything besides ascii digits
/// or does not fit into an u64.
pub fn parse_u64_token(s: &str) -> Option<u64> {
	let mut iter = StrParser::new(s);
	let num = parse_u64(&mut iter)?;
	// trailing bytes like `12a` or `1.5`
	let rest = iter.record().consume_to_str();
	rest.is_empty().then(|| num)
}

// parses a part of a slice
fn parse_u64<'s, I>(iter: &mut I) -> Option<u64>
where I: ParseIterator<'s> {

	let mut iter = iter.record();

	// at least one digit, no sign
	iter.while_byte_fn(u8::is_ascii_digit)
		.consume_at_least(1)
		.ok()?;

	iter.to_str()
		.parse().ok()
}

/// Returns the amount of clock ticks per second the kernel reports
/// for this system (`USER_HZ`).
pub fn clock_ticks() -> Option<u64> {
	// safe because sysconf has no preconditions
	let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
	(ticks > 0).then(|| ticks as u64)
}

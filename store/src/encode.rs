use std::io::{self, Write};

/// Binary serialization for the checkpoint's own fields. There is no
/// `StaticEncodedLen` here (unlike a paged, random-access store) since a
/// checkpoint is read and written whole, once, never paged into fixed-size
/// slots.
pub trait Encode {
	fn encode(&self, output: &mut impl Write) -> Result<u32, io::Error>;
}

impl Encode for u32 {
	fn encode(&self, output: &mut impl Write) -> Result<u32, io::Error> {
		output.write_all(&self.to_be_bytes())?;
		Ok(4)
	}
}

impl Encode for str {
	fn encode(&self, output: &mut impl Write) -> Result<u32, io::Error> {
		let bytes = self.as_bytes();
		(bytes.len() as u32).encode(output)?;
		output.write_all(bytes)?;
		Ok(4 + bytes.len() as u32)
	}
}

impl Encode for [String] {
	fn encode(&self, output: &mut impl Write) -> Result<u32, io::Error> {
		let mut len = (self.len() as u32).encode(output)?;
		for s in self {
			len += s.as_str().encode(output)?;
		}
		Ok(len)
	}
}

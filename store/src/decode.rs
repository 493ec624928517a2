use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("not a vocabulary checkpoint (bad tag)")]
	InvalidTag,

	#[error("unsupported checkpoint version {0}")]
	UnsupportedVersion(u32),

	#[error("checkpoint string table is not valid UTF-8")]
	InvalidUtf8,

	#[error(transparent)]
	Vocabulary(#[from] metarule_core::Error),
}

pub trait Decode: Sized {
	fn decode(input: &mut impl Read) -> Result<Self, Error>;
}

impl Decode for u32 {
	fn decode(input: &mut impl Read) -> Result<Self, Error> {
		let mut buf = [0u8; 4];
		input.read_exact(&mut buf)?;
		Ok(u32::from_be_bytes(buf))
	}
}

pub fn decode_string(input: &mut impl Read) -> Result<String, Error> {
	let len = u32::decode(input)? as usize;
	let mut buf = vec![0u8; len];
	input.read_exact(&mut buf)?;
	String::from_utf8(buf).map_err(|_| Error::InvalidUtf8)
}

pub fn decode_string_table(input: &mut impl Read) -> Result<Vec<String>, Error> {
	let count = u32::decode(input)?;
	(0..count).map(|_| decode_string(input)).collect()
}

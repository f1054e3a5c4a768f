use std::fmt::{Display, Formatter};
use serde::{Serialize, Serializer};
use crate::config::CacheGeometry;
use crate::error::SimError;

/// A fixed-width unsigned bit string, most significant bit first
///
/// Equality compares both the value and the width, so two fields are only equal when their
/// binary renderings are identical
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct BitField {
    value: u32,
    width: u8,
}

impl BitField {
    /// Creates a field of `width` bits. Panics if `value` doesn't fit
    pub fn new(value: u32, width: u8) -> Self {
        assert!(width <= 32, "bit fields are at most 32 bits wide, got {width}");
        assert!(
            width == 32 || value >> width == 0,
            "{value} does not fit in {width} bits"
        );
        Self { value, width }
    }

    /// An all-zero field, used for the tag of lines which have never been filled
    pub fn zero(width: u8) -> Self {
        Self::new(0, width)
    }

    /// Parses a string of `0` and `1` characters. The width is the length of the string
    ///
    /// Errors are worded for addresses: more than 32 characters is an
    /// [`SimError::InvalidAddressLength`], anything but `0` or `1` an
    /// [`SimError::InvalidAddressDigit`]. Callers parsing other fields should check the length
    /// themselves and reword the error
    ///
    /// # Examples
    ///
    /// ```
    /// use cachemap::bitfield::BitField;
    /// let tag = BitField::parse("0101").unwrap();
    /// assert_eq!(tag.value(), 5);
    /// assert_eq!(tag.width(), 4);
    /// assert_eq!(tag.to_string(), "0101");
    /// ```
    pub fn parse(bits: &str) -> Result<Self, SimError> {
        let width = bits.chars().count();
        if width > 32 {
            return Err(SimError::InvalidAddressLength { expected: 32, actual: width });
        }
        let mut value: u32 = 0;
        for (position, found) in bits.chars().enumerate() {
            let bit = match found {
                '0' => 0,
                '1' => 1,
                _ => return Err(SimError::InvalidAddressDigit { position, found }),
            };
            value = (value << 1) | bit;
        }
        Ok(Self { value, width: width as u8 })
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// The value as an index into a collection of lines, sets or words
    pub fn as_index(&self) -> usize {
        self.value as usize
    }
}

impl Display for BitField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.width == 0 {
            return Ok(());
        }
        write!(f, "{:0width$b}", self.value, width = self.width as usize)
    }
}

// Serialised as the bit string itself, which is what a presentation layer renders
impl Serialize for BitField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An address split into its fields, in the order they appear in the address
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct ParsedAddress {
    pub tag: BitField,
    /// The line (direct mapped) or set (set associative) bits. Fully associative caches have none
    pub index: Option<BitField>,
    pub word: BitField,
}

impl ParsedAddress {
    /// Position of the requested word within its block
    pub fn word_index(&self) -> usize {
        self.word.as_index()
    }

    pub fn index_value(&self) -> Option<usize> {
        self.index.map(|index| index.as_index())
    }

    /// Number of the backing memory block holding this address, i.e. the address without its
    /// word offset
    pub fn block_number(&self) -> u32 {
        match self.index {
            Some(index) => self.tag.value() << index.width() | index.value(),
            None => self.tag.value(),
        }
    }

    /// The full address as a single number
    pub fn value(&self) -> u32 {
        self.block_number() << self.word.width() | self.word.value()
    }
}

impl Display for ParsedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}{}{}", self.tag, index, self.word),
            None => write!(f, "{}{}", self.tag, self.word),
        }
    }
}

/// Splits a binary address into `[tag][index][word]` for the given geometry
///
/// The address must be exactly `address_bits` long and made only of `0` and `1`; nothing is
/// returned for a malformed address
///
/// # Arguments
///
/// * `address`: The address as typed by the user, most significant bit first
/// * `geometry`: The validated geometry of the active cache
///
/// returns: Result<ParsedAddress, SimError>
///
/// # Examples
///
/// ```
/// use cachemap::bitfield::decode;
/// use cachemap::config::CacheConfig;
/// let config = CacheConfig::direct("example", 4, 4, 64);
/// let geometry = config.validate().unwrap();
/// let parsed = decode("10110110", &geometry).unwrap();
/// assert_eq!(parsed.tag.to_string(), "1011");
/// assert_eq!(parsed.index_value(), Some(1));
/// assert_eq!(parsed.word_index(), 2);
/// ```
pub fn decode(address: &str, geometry: &CacheGeometry) -> Result<ParsedAddress, SimError> {
    let expected = geometry.address_bits() as usize;
    let actual = address.chars().count();
    if actual != expected {
        return Err(SimError::InvalidAddressLength { expected, actual });
    }
    let bits = BitField::parse(address)?;
    let word_bits = geometry.word_bits();
    let index_bits = geometry.index_bits();
    let word = bits.value() & low_mask(word_bits);
    let index = (bits.value() >> word_bits) & low_mask(index_bits);
    let tag = bits.value() >> (word_bits + index_bits);
    Ok(ParsedAddress {
        tag: BitField::new(tag, geometry.tag_bits()),
        index: (index_bits > 0).then(|| BitField::new(index, index_bits)),
        word: BitField::new(word, word_bits),
    })
}

fn low_mask(bits: u8) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1 << bits) - 1
    }
}

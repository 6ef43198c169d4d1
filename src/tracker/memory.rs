use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Widest address bus a memory image may declare.
pub const MAX_ADDRESS_SIZE: u32 = 16;
/// Widest data word a memory image may declare.
pub const MAX_DATA_SIZE: u32 = 16;

/// Errors raised while building, loading or storing a memory image.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("failed to access memory image {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("memory image line {line}: {reason}")]
    Format { line: usize, reason: String },
    #[error("unsupported memory geometry A{address_size}D{data_size}")]
    Geometry { address_size: u32, data_size: u32 },
    #[error("value {value:#b} does not fit the {width}-bit {what}")]
    OutOfRange {
        what: &'static str,
        value: u32,
        width: u32,
    },
}

/// Emulated FPGA lookup memory with `2^address_size` pre-allocated entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupMemory {
    address_size: u32,
    data_size: u32,
    default_data: u16,
    description: String,
    table: Vec<u16>,
}

impl LookupMemory {
    pub fn new(address_size: u32, data_size: u32, default_data: u16) -> Result<Self, MemoryError> {
        if address_size == 0
            || address_size > MAX_ADDRESS_SIZE
            || data_size == 0
            || data_size > MAX_DATA_SIZE
        {
            return Err(MemoryError::Geometry {
                address_size,
                data_size,
            });
        }
        check_width("default data", u32::from(default_data), data_size)?;
        Ok(Self {
            address_size,
            data_size,
            default_data,
            description: String::new(),
            table: vec![default_data; 1 << address_size],
        })
    }

    /// A→D1 memory answering 1 when at least `min` address bits are set.
    pub fn min_multiplicity(address_size: u32, min: u32) -> Result<Self, MemoryError> {
        let mut memory = Self::new(address_size, 1, 0)?;
        memory.description = format!("minimum multiplicity {min} over {address_size} bits");
        for address in 0..memory.entries() {
            if address.count_ones() >= min {
                memory.push(address, 1)?;
            }
        }
        Ok(memory)
    }

    /// A9→D2 layer projection memory: bit 0 inner half, bit 1 outer half.
    ///
    /// Layers 0..=4 form the inner half and layers 4..=8 the outer one.
    pub fn layer_io(min: u32) -> Result<Self, MemoryError> {
        let half = Self::min_multiplicity(5, min)?;
        let mut memory = Self::new(9, 2, 0)?;
        memory.description = format!("inner/outer layer projection, {min} layers per half");
        for address in 0..memory.entries() {
            let inner = half.fetch(address & 0b1_1111);
            let outer = half.fetch(address >> 4);
            memory.push(address, inner | (outer << 1))?;
        }
        Ok(memory)
    }

    /// A12→D3 row projection memory for a zone of `width` rows.
    ///
    /// Data bit 0 is the right (high rows) section, bit 1 the middle and bit 2
    /// the left (low rows) section.
    pub fn row_sections(width: u32) -> Result<Self, MemoryError> {
        if !(3..=12).contains(&width) {
            return Err(MemoryError::OutOfRange {
                what: "zone width",
                value: width,
                width: 12,
            });
        }
        let side = width / 3;
        let left = (1u32 << side) - 1;
        let right = left << (width - side);
        let mid = ((1u32 << width) - 1) & !left & !right;
        let mut memory = Self::new(12, 3, 0)?;
        memory.description = format!("left/mid/right row projection, {width} rows");
        for address in 0..memory.entries() {
            let mut data = 0;
            if address & right != 0 {
                data |= 0b001;
            }
            if address & mid != 0 {
                data |= 0b010;
            }
            if address & left != 0 {
                data |= 0b100;
            }
            memory.push(address, data)?;
        }
        Ok(memory)
    }

    pub fn address_size(&self) -> u32 {
        self.address_size
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    pub fn default_data(&self) -> u16 {
        self.default_data
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Number of addressable entries.
    pub fn entries(&self) -> u32 {
        1 << self.address_size
    }

    pub fn push(&mut self, address: u32, data: u16) -> Result<(), MemoryError> {
        check_width("address", address, self.address_size)?;
        check_width("data", u32::from(data), self.data_size)?;
        self.table[address as usize] = data;
        Ok(())
    }

    /// Reads one entry; address bits above the bus width are ignored.
    pub fn fetch(&self, address: u32) -> u16 {
        self.table[(address & (self.entries() - 1)) as usize]
    }

    /// Renders the text image; entries equal to the default are omitted.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if !self.description.is_empty() {
            let _ = writeln!(out, "#@description = {}", self.description);
        }
        let _ = writeln!(out, "#@address_size = {}", self.address_size);
        let _ = writeln!(out, "#@data_size = {}", self.data_size);
        let _ = writeln!(
            out,
            "#@default_data = {}",
            bits(u32::from(self.default_data), self.data_size)
        );
        for (address, data) in self.table.iter().enumerate() {
            if *data != self.default_data {
                let _ = writeln!(
                    out,
                    "{} {}",
                    bits(address as u32, self.address_size),
                    bits(u32::from(*data), self.data_size)
                );
            }
        }
        out
    }

    /// Parses a text image.
    pub fn from_text(payload: &str) -> Result<Self, MemoryError> {
        let mut header = ImageHeader::default();
        let mut memory: Option<LookupMemory> = None;
        for (idx, raw) in payload.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(meta) = line.strip_prefix("#@") {
                if memory.is_some() {
                    return Err(format_error(line_no, "metadata outside header"));
                }
                header.apply(meta, line_no)?;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if memory.is_none() {
                memory = Some(header.build(line_no)?);
            }
            let Some(image) = memory.as_mut() else {
                continue;
            };
            let mut tokens = line.split_whitespace();
            let (Some(address), Some(data), None) = (tokens.next(), tokens.next(), tokens.next())
            else {
                return Err(format_error(line_no, "expected '<address> <data>'"));
            };
            let address = parse_bits(address, image.address_size, line_no)?;
            let data = parse_bits(data, image.data_size, line_no)? as u16;
            image.push(address, data)?;
        }
        match memory {
            Some(image) => Ok(image),
            None => header.build(payload.lines().count()),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path_ref = path.as_ref();
        let payload = fs::read_to_string(path_ref).map_err(|source| MemoryError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        Self::from_text(&payload)
    }

    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), MemoryError> {
        let path_ref = path.as_ref();
        fs::write(path_ref, self.to_text()).map_err(|source| MemoryError::Io {
            path: path_ref.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Default)]
struct ImageHeader {
    description: Option<String>,
    address_size: Option<u32>,
    data_size: Option<u32>,
    default_data: Option<String>,
}

impl ImageHeader {
    fn apply(&mut self, meta: &str, line_no: usize) -> Result<(), MemoryError> {
        let Some((key, value)) = meta.split_once('=') else {
            return Err(format_error(line_no, "expected '#@key = value'"));
        };
        let value = value.trim();
        match key.trim() {
            "description" => self.description = Some(value.to_string()),
            "address_size" => self.address_size = Some(parse_size(value, line_no)?),
            "data_size" => self.data_size = Some(parse_size(value, line_no)?),
            "default_data" => self.default_data = Some(value.to_string()),
            other => {
                return Err(format_error(
                    line_no,
                    &format!("unsupported metadata '{other}'"),
                ))
            }
        }
        Ok(())
    }

    fn build(&self, line_no: usize) -> Result<LookupMemory, MemoryError> {
        let (Some(address_size), Some(data_size)) = (self.address_size, self.data_size) else {
            return Err(format_error(line_no, "address_size and data_size are required"));
        };
        let default_data = match &self.default_data {
            Some(value) => parse_bits(value, data_size, line_no)? as u16,
            None => 0,
        };
        let mut memory = LookupMemory::new(address_size, data_size, default_data)?;
        if let Some(description) = &self.description {
            memory.description = description.clone();
        }
        Ok(memory)
    }
}

fn check_width(what: &'static str, value: u32, width: u32) -> Result<(), MemoryError> {
    if width < 32 && value >> width != 0 {
        return Err(MemoryError::OutOfRange { what, value, width });
    }
    Ok(())
}

fn bits(value: u32, width: u32) -> String {
    format!("{value:0width$b}", width = width as usize)
}

fn parse_bits(token: &str, width: u32, line_no: usize) -> Result<u32, MemoryError> {
    if token.len() != width as usize {
        return Err(format_error(
            line_no,
            &format!("'{token}' is not a {width}-bit word"),
        ));
    }
    u32::from_str_radix(token, 2)
        .map_err(|_| format_error(line_no, &format!("'{token}' is not a binary word")))
}

fn parse_size(value: &str, line_no: usize) -> Result<u32, MemoryError> {
    value
        .parse()
        .map_err(|_| format_error(line_no, &format!("'{value}' is not a size")))
}

fn format_error(line: usize, reason: &str) -> MemoryError {
    MemoryError::Format {
        line,
        reason: reason.to_string(),
    }
}

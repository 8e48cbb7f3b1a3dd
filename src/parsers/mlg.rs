//! MegaLogViewer binary (.mlg) log parser.
//!
//! MegaSquirt, Speeduino and rusEFI firmwares all log in this format.
//! Layout (all integers big-endian):
//! - Header: `MLVLG` magic plus one pad byte, format version (i16),
//!   timestamp (i32), info offset (u16 in v1, u32 in v2), data offset (u32),
//!   record length (i16), field count (u16)
//! - Field descriptors: 55 bytes each in v1, 89 bytes in v2
//! - Blocks: type (u8), counter (u8), timestamp in ms (u16), then either a
//!   data record followed by a CRC byte, or a 50 byte marker message

use super::types::{Channel, Log, Meta, MlgMeta, ParseError};

const MAGIC: &[u8; 5] = b"MLVLG";
const NAME_LEN: usize = 34;
const UNITS_LEN: usize = 10;
const CATEGORY_LEN: usize = 34;
const MARKER_LEN: usize = 50;
const MAX_FIELDS: usize = 1000;

/// The 16-bit millisecond timestamp wraps every 65.536 s
const TIMESTAMP_WRAP_SECONDS: f64 = 65.536;
/// A backwards jump larger than this (in ms) is a wraparound, not jitter
const WRAP_DETECT_MS: u16 = 30_000;

/// Storage type of a logged field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    I64,
    F32,
    Bits8,
    Bits16,
    Bits32,
}

impl FieldKind {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::U8,
            1 => Self::I8,
            2 => Self::U16,
            3 => Self::I16,
            4 => Self::U32,
            5 => Self::I32,
            6 => Self::I64,
            7 => Self::F32,
            10 => Self::Bits8,
            11 => Self::Bits16,
            12 => Self::Bits32,
            _ => return None,
        })
    }

    fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 | Self::Bits8 => 1,
            Self::U16 | Self::I16 | Self::Bits16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Bits32 => 4,
            Self::I64 => 8,
        }
    }

    fn is_bitfield(self) -> bool {
        matches!(self, Self::Bits8 | Self::Bits16 | Self::Bits32)
    }
}

#[derive(Clone, Debug)]
struct Field {
    name: String,
    unit: String,
    kind: FieldKind,
    scale: f64,
    transform: f64,
}

impl Field {
    fn decode(&self, bytes: &[u8]) -> f64 {
        let raw = match self.kind {
            FieldKind::U8 => bytes[0] as f64,
            FieldKind::I8 => bytes[0] as i8 as f64,
            FieldKind::U16 => u16::from_be_bytes([bytes[0], bytes[1]]) as f64,
            FieldKind::I16 => i16::from_be_bytes([bytes[0], bytes[1]]) as f64,
            FieldKind::U32 => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            FieldKind::I32 => i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            FieldKind::F32 => f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            FieldKind::I64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes[..8]);
                i64::from_be_bytes(buf) as f64
            }
            // Bit flags carry no scalar meaning for rate analysis
            FieldKind::Bits8 | FieldKind::Bits16 | FieldKind::Bits32 => return 0.0,
        };
        (raw + self.transform) * self.scale
    }
}

/// Bounds-checked big-endian cursor over the file bytes
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < len {
            return Err(ParseError::InvalidBinary(format!(
                "unexpected end of file at offset {} (need {} bytes, have {})",
                self.pos,
                len,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        self.take(len).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ParseError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn i16(&mut self) -> Result<i16, ParseError> {
        Ok(self.u16()? as i16)
    }

    fn u32(&mut self) -> Result<u32, ParseError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, ParseError> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn text(&mut self, len: usize) -> Result<String, ParseError> {
        let raw = self.take(len)?;
        Ok(String::from_utf8_lossy(raw)
            .trim_end_matches('\0')
            .trim()
            .to_string())
    }
}

/// MegaLogViewer binary parser
pub struct Mlg;

impl Mlg {
    /// Detect the MLG magic bytes
    pub fn detect(data: &[u8]) -> bool {
        data.len() >= MAGIC.len() && &data[..MAGIC.len()] == MAGIC
    }

    pub fn parse_binary(data: &[u8]) -> Result<Log, ParseError> {
        if !Self::detect(data) {
            return Err(ParseError::InvalidBinary("missing MLVLG header".into()));
        }

        let mut reader = ByteReader::new(data);
        reader.skip(MAGIC.len() + 1)?;
        let format_version = reader.i16()?;
        let is_v2 = format_version == 2;
        reader.skip(4)?;
        let info_start = if is_v2 {
            reader.u32()? as usize
        } else {
            reader.u16()? as usize
        };
        let data_start = reader.u32()? as usize;
        reader.skip(2)?;
        let field_count = reader.u16()? as usize;

        tracing::debug!(
            "MLG v{}: {} fields, data at offset {}",
            format_version,
            field_count,
            data_start
        );

        if field_count > MAX_FIELDS {
            return Err(ParseError::InvalidBinary(format!(
                "unreasonable field count {}",
                field_count
            )));
        }
        if data_start > data.len() {
            return Err(ParseError::InvalidBinary(format!(
                "data offset {} exceeds file size {}",
                data_start,
                data.len()
            )));
        }

        let fields = (0..field_count)
            .map(|_| read_field(&mut reader, is_v2))
            .collect::<Result<Vec<_>, _>>()?;

        let mut meta = MlgMeta {
            format_version,
            ..MlgMeta::default()
        };
        if info_start < data_start {
            let info = String::from_utf8_lossy(&data[info_start..data_start]);
            if let Some(start) = info.find("Capture Date:") {
                let tail = &info[start + "Capture Date:".len()..];
                let end = tail.find(['"', '\0', '\n']).unwrap_or(tail.len());
                meta.capture_date = tail[..end].trim().to_string();
            }
        }

        let record_len: usize = fields.iter().map(|f| f.kind.width()).sum::<usize>() + 1;
        let mut reader = ByteReader::new(data);
        reader.pos = data_start;

        let mut times = Vec::with_capacity(reader.remaining() / (record_len + 4));
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(times.capacity());
        let mut prev_ms: u16 = 0;
        let mut wraps: u64 = 0;

        while reader.remaining() >= 4 {
            let block_type = reader.u8()?;
            reader.skip(1)?;
            let ms = reader.u16()?;

            if ms < prev_ms && prev_ms - ms > WRAP_DETECT_MS {
                wraps += 1;
            }
            prev_ms = ms;

            match block_type {
                0 => {
                    let Ok(record) = reader.take(record_len) else {
                        tracing::warn!("Truncated MLG record at offset {}", reader.pos);
                        break;
                    };
                    let mut offset = 0;
                    let row: Vec<f64> = fields
                        .iter()
                        .map(|f| {
                            let value = f.decode(&record[offset..]);
                            offset += f.kind.width();
                            value
                        })
                        .collect();
                    times.push(ms as f64 / 1000.0 + wraps as f64 * TIMESTAMP_WRAP_SECONDS);
                    rows.push(row);
                }
                1 => {
                    if reader.skip(MARKER_LEN).is_err() {
                        tracing::warn!("Truncated MLG marker block");
                        break;
                    }
                    meta.marker_count += 1;
                }
                other => {
                    tracing::warn!(
                        "Unknown MLG block type {} at offset {}, stopping",
                        other,
                        reader.pos - 4
                    );
                    break;
                }
            }
        }

        tracing::info!(
            "Parsed MLG log: {} channels, {} records, {} markers",
            fields.len(),
            rows.len(),
            meta.marker_count
        );

        Ok(Log {
            meta: Meta::Mlg(meta),
            channels: fields
                .into_iter()
                .map(|f| Channel::new(f.name, f.unit))
                .collect(),
            times,
            data: rows,
        })
    }
}

fn read_field(reader: &mut ByteReader<'_>, is_v2: bool) -> Result<Field, ParseError> {
    let code = reader.u8()?;
    let kind = FieldKind::from_code(code).ok_or(ParseError::UnknownFieldType(code))?;
    let name = reader.text(NAME_LEN)?;
    let unit = reader.text(UNITS_LEN)?;
    reader.skip(1)?; // display style

    // Scalars carry scale, transform and digits; bitfields pad to the same length
    let (scale, transform) = if kind.is_bitfield() {
        reader.skip(9)?;
        (1.0, 0.0)
    } else {
        let scale = reader.f32()? as f64;
        let transform = reader.f32()? as f64;
        reader.skip(1)?;
        (scale, transform)
    };
    if is_v2 {
        reader.skip(CATEGORY_LEN)?;
    }

    Ok(Field {
        name,
        unit,
        kind,
        scale,
        transform,
    })
}

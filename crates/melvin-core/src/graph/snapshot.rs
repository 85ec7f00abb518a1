//! Binary snapshot format.
//!
//! Stream of length-prefixed records delimited by a repeated 16-bit
//! sentinel, little-endian throughout, terminated by a 32-bit CRC of the
//! preceding bytes. Records appear in canonical order:
//! nodes ascending by id, then for each node its out-edges ascending
//! by `(dst, rel)`.

use std::io::{self, Read, Write};

use super::node::{NodeKind, RelType};
use crate::error::{MelvinError, Result};

const SENTINEL_TAUGHT: u16 = 0x0001;
const SENTINEL_THOUGHT: u16 = 0x1110;
const SENTINEL_CONNECTION: u16 = 0x0101;

/// A CRC-32 (IEEE 802.3) hasher, computed table-free (bit-by-bit) since the
/// snapshot format only needs a trailing integrity check, not throughput.
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let mut c = (self.state ^ byte as u32) & 0xFF;
            for _ in 0..8 {
                c = if c & 1 != 0 {
                    0xEDB8_8320 ^ (c >> 1)
                } else {
                    c >> 1
                };
            }
            self.state = (self.state >> 8) ^ c;
        }
    }

    pub fn finalize(self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// A writer that tracks a running CRC over everything written.
struct CrcWriter<W: Write> {
    inner: W,
    crc: Crc32,
}

impl<W: Write> Write for CrcWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.crc.update(buf);
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub struct TaughtNodeRecord {
    pub id: u64,
    pub kind: NodeKind,
    pub text: String,
    pub embedding: Vec<f32>,
}

pub struct ThoughtNodeRecord {
    pub id: u64,
    pub path: Vec<u64>,
}

pub struct ConnectionRecord {
    pub src: u64,
    pub rel: RelType,
    pub dst: u64,
    pub w_core: f32,
    pub w_ctx: f32,
    pub count: u32,
    pub last_access_ns: u64,
    pub contradiction: f32,
}

pub fn write_taught_node<W: Write>(w: &mut W, rec: &TaughtNodeRecord) -> io::Result<()> {
    w.write_all(&SENTINEL_TAUGHT.to_le_bytes())?;
    w.write_all(&rec.id.to_le_bytes())?;
    w.write_all(&[rec.kind.as_u8()])?;
    let text_bytes = rec.text.as_bytes();
    w.write_all(&(text_bytes.len() as u32).to_le_bytes())?;
    w.write_all(text_bytes)?;
    w.write_all(&(rec.embedding.len() as u16).to_le_bytes())?;
    for f in &rec.embedding {
        w.write_all(&f.to_le_bytes())?;
    }
    w.write_all(&SENTINEL_TAUGHT.to_le_bytes())?;
    Ok(())
}

pub fn write_thought_node<W: Write>(w: &mut W, rec: &ThoughtNodeRecord) -> io::Result<()> {
    w.write_all(&SENTINEL_THOUGHT.to_le_bytes())?;
    w.write_all(&rec.id.to_le_bytes())?;
    w.write_all(&(rec.path.len() as u32).to_le_bytes())?;
    for id in &rec.path {
        w.write_all(&id.to_le_bytes())?;
    }
    w.write_all(&SENTINEL_THOUGHT.to_le_bytes())?;
    Ok(())
}

pub fn write_connection<W: Write>(w: &mut W, rec: &ConnectionRecord) -> io::Result<()> {
    w.write_all(&SENTINEL_CONNECTION.to_le_bytes())?;
    w.write_all(&rec.src.to_le_bytes())?;
    w.write_all(&[rec.rel.as_u8()])?;
    w.write_all(&rec.dst.to_le_bytes())?;
    w.write_all(&rec.w_core.to_le_bytes())?;
    w.write_all(&rec.w_ctx.to_le_bytes())?;
    w.write_all(&rec.count.to_le_bytes())?;
    w.write_all(&rec.last_access_ns.to_le_bytes())?;
    w.write_all(&rec.contradiction.to_le_bytes())?;
    w.write_all(&SENTINEL_CONNECTION.to_le_bytes())?;
    Ok(())
}

/// Records decoded from a snapshot stream, in file order.
pub enum Record {
    Taught(TaughtNodeRecord),
    Thought(ThoughtNodeRecord),
    Connection(ConnectionRecord),
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f32<R: Read>(r: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read the whole record stream (everything except the trailing CRC) and
/// verify the CRC matches.
pub fn read_all(bytes: &[u8]) -> Result<Vec<Record>> {
    if bytes.len() < 4 {
        return Err(MelvinError::SnapshotCorrupt("file too short".into()));
    }
    let (body, crc_bytes) = bytes.split_at(bytes.len() - 4);
    let expected = u32::from_le_bytes(crc_bytes.try_into().unwrap());
    let mut crc = Crc32::new();
    crc.update(body);
    let actual = crc.finalize();
    if actual != expected {
        return Err(MelvinError::SnapshotCorrupt(format!(
            "crc mismatch: expected {expected:#x}, got {actual:#x}"
        )));
    }

    let mut cursor = io::Cursor::new(body);
    let mut records = Vec::new();
    while (cursor.position() as usize) < body.len() {
        let sentinel = read_u16(&mut cursor)
            .map_err(|e| MelvinError::SnapshotCorrupt(format!("truncated sentinel: {e}")))?;
        match sentinel {
            SENTINEL_TAUGHT => {
                let id = read_u64(&mut cursor)?;
                let mut kind_byte = [0u8; 1];
                cursor
                    .read_exact(&mut kind_byte)
                    .map_err(|e| MelvinError::SnapshotCorrupt(e.to_string()))?;
                let text_len = read_u32(&mut cursor)? as usize;
                let mut text_buf = vec![0u8; text_len];
                cursor
                    .read_exact(&mut text_buf)
                    .map_err(|e| MelvinError::SnapshotCorrupt(e.to_string()))?;
                let text = String::from_utf8(text_buf)
                    .map_err(|e| MelvinError::SnapshotCorrupt(e.to_string()))?;
                let emb_dim = read_u16(&mut cursor)? as usize;
                let mut embedding = Vec::with_capacity(emb_dim);
                for _ in 0..emb_dim {
                    embedding.push(read_f32(&mut cursor)?);
                }
                let end_sentinel = read_u16(&mut cursor)?;
                if end_sentinel != SENTINEL_TAUGHT {
                    return Err(MelvinError::SnapshotCorrupt(
                        "unterminated taught-node record".into(),
                    ));
                }
                records.push(Record::Taught(TaughtNodeRecord {
                    id,
                    kind: NodeKind::from_u8(kind_byte[0]),
                    text,
                    embedding,
                }));
            }
            SENTINEL_THOUGHT => {
                let id = read_u64(&mut cursor)?;
                let path_len = read_u32(&mut cursor)? as usize;
                let mut path = Vec::with_capacity(path_len);
                for _ in 0..path_len {
                    path.push(read_u64(&mut cursor)?);
                }
                let end_sentinel = read_u16(&mut cursor)?;
                if end_sentinel != SENTINEL_THOUGHT {
                    return Err(MelvinError::SnapshotCorrupt(
                        "unterminated thought-node record".into(),
                    ));
                }
                records.push(Record::Thought(ThoughtNodeRecord { id, path }));
            }
            SENTINEL_CONNECTION => {
                let src = read_u64(&mut cursor)?;
                let mut rel_byte = [0u8; 1];
                cursor
                    .read_exact(&mut rel_byte)
                    .map_err(|e| MelvinError::SnapshotCorrupt(e.to_string()))?;
                let rel = RelType::from_u8(rel_byte[0])
                    .ok_or_else(|| MelvinError::SnapshotCorrupt("bad rel byte".into()))?;
                let dst = read_u64(&mut cursor)?;
                let w_core = read_f32(&mut cursor)?;
                let w_ctx = read_f32(&mut cursor)?;
                let count = read_u32(&mut cursor)?;
                let last_access_ns = read_u64(&mut cursor)?;
                let contradiction = read_f32(&mut cursor)?;
                let end_sentinel = read_u16(&mut cursor)?;
                if end_sentinel != SENTINEL_CONNECTION {
                    return Err(MelvinError::SnapshotCorrupt(
                        "unterminated connection record".into(),
                    ));
                }
                records.push(Record::Connection(ConnectionRecord {
                    src,
                    rel,
                    dst,
                    w_core,
                    w_ctx,
                    count,
                    last_access_ns,
                    contradiction,
                }));
            }
            other => {
                return Err(MelvinError::SnapshotCorrupt(format!(
                    "unknown record sentinel {other:#x}"
                )));
            }
        }
    }
    Ok(records)
}

/// Write a full snapshot (records already in canonical order) with the
/// trailing CRC, to any `Write` sink.
pub fn write_snapshot<W: Write>(
    sink: &mut W,
    taught: &[TaughtNodeRecord],
    thoughts: &[ThoughtNodeRecord],
    connections: &[ConnectionRecord],
) -> io::Result<()> {
    let mut w = CrcWriter {
        inner: sink,
        crc: Crc32::new(),
    };
    for rec in taught {
        write_taught_node(&mut w, rec)?;
    }
    for rec in thoughts {
        write_thought_node(&mut w, rec)?;
    }
    for rec in connections {
        write_connection(&mut w, rec)?;
    }
    let crc = w.crc.finalize();
    w.inner.write_all(&crc.to_le_bytes())
}

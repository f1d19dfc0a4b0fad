//! Reader for the header of iden3 R1CS binary files.
//!
//! Only the header section is parsed; the constraint and wire-map sections
//! are skipped. The header carries everything the harness reports: wire,
//! input, output, label and constraint counts.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::{BenchError, BenchResult};

pub const R1CS_MAGIC: [u8; 4] = *b"r1cs";
pub const R1CS_VERSION: u32 = 1;

const SECTION_HEADER: u32 = 1;

/// Little-endian bytes of the BN254 scalar field prime, the field circom
/// selects for the "bn128" identifier.
pub const BN128_PRIME_LE: [u8; 32] = [
    0x01, 0x00, 0x00, 0xf0, 0x93, 0xf5, 0xe1, 0x43, 0x91, 0x70, 0xb9, 0x79, 0x48, 0xe8, 0x33,
    0x28, 0x5d, 0x58, 0x81, 0x81, 0xb6, 0x45, 0x50, 0xb8, 0x29, 0xa0, 0x31, 0xe1, 0x72, 0x4e,
    0x64, 0x30,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R1csHeader {
    /// Field element size in bytes (n8)
    pub field_size: u32,
    /// Field modulus, little-endian, `field_size` bytes
    pub prime: Vec<u8>,
    pub n_wires: u32,
    pub n_pub_outputs: u32,
    pub n_pub_inputs: u32,
    pub n_prv_inputs: u32,
    pub n_labels: u64,
    pub n_constraints: u32,
}

fn read_u32<R: Read>(r: &mut R) -> BenchResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|e| BenchError::Message(format!("truncated r1cs file: {e}")))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> BenchResult<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)
        .map_err(|e| BenchError::Message(format!("truncated r1cs file: {e}")))?;
    Ok(u64::from_le_bytes(buf))
}

/// Parse the header section of an R1CS file.
///
/// Fails if the magic/version do not match, no header section is present,
/// or the header reports zero wires (every well-formed circuit has at least
/// the constant wire).
pub fn read_header(path: &Path) -> BenchResult<R1csHeader> {
    let file = File::open(path)
        .map_err(|e| BenchError::Message(format!("cannot open {}: {e}", path.display())))?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)
        .map_err(|e| BenchError::Message(format!("truncated r1cs file: {e}")))?;
    if magic != R1CS_MAGIC {
        return Err(BenchError::Message(format!(
            "{} is not an r1cs file (bad magic)",
            path.display()
        )));
    }
    let version = read_u32(&mut r)?;
    if version != R1CS_VERSION {
        return Err(BenchError::Message(format!(
            "unsupported r1cs version {version} in {}",
            path.display()
        )));
    }
    let n_sections = read_u32(&mut r)?;

    for _ in 0..n_sections {
        let section_type = read_u32(&mut r)?;
        let section_size = read_u64(&mut r)?;
        if section_type != SECTION_HEADER {
            r.seek(SeekFrom::Current(section_size as i64))
                .map_err(|e| BenchError::Message(format!("seek failed: {e}")))?;
            continue;
        }

        let field_size = read_u32(&mut r)?;
        let mut prime = vec![0u8; field_size as usize];
        r.read_exact(&mut prime)
            .map_err(|e| BenchError::Message(format!("truncated r1cs header: {e}")))?;
        let n_wires = read_u32(&mut r)?;
        let n_pub_outputs = read_u32(&mut r)?;
        let n_pub_inputs = read_u32(&mut r)?;
        let n_prv_inputs = read_u32(&mut r)?;
        let n_labels = read_u64(&mut r)?;
        let n_constraints = read_u32(&mut r)?;

        if n_wires == 0 {
            return Err(BenchError::Message(format!(
                "{} reports zero wires; a well-formed circuit has at least the constant wire",
                path.display()
            )));
        }

        return Ok(R1csHeader {
            field_size,
            prime,
            n_wires,
            n_pub_outputs,
            n_pub_inputs,
            n_prv_inputs,
            n_labels,
            n_constraints,
        });
    }

    Err(BenchError::Message(format!(
        "{} has no header section",
        path.display()
    )))
}

/// Write a header-only R1CS file. Used by the mock compiler and tests; the
/// layout matches what [`read_header`] expects from real circom output.
pub fn write_header(path: &Path, header: &R1csHeader) -> BenchResult<()> {
    let mut out = Vec::new();
    out.extend_from_slice(&R1CS_MAGIC);
    out.extend_from_slice(&R1CS_VERSION.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // one section

    let section_size = 4 + header.prime.len() as u64 + 4 * 4 + 8 + 4;
    out.extend_from_slice(&SECTION_HEADER.to_le_bytes());
    out.extend_from_slice(&section_size.to_le_bytes());
    out.extend_from_slice(&header.field_size.to_le_bytes());
    out.extend_from_slice(&header.prime);
    out.extend_from_slice(&header.n_wires.to_le_bytes());
    out.extend_from_slice(&header.n_pub_outputs.to_le_bytes());
    out.extend_from_slice(&header.n_pub_inputs.to_le_bytes());
    out.extend_from_slice(&header.n_prv_inputs.to_le_bytes());
    out.extend_from_slice(&header.n_labels.to_le_bytes());
    out.extend_from_slice(&header.n_constraints.to_le_bytes());

    let mut file = File::create(path)
        .map_err(|e| BenchError::Message(format!("cannot create {}: {e}", path.display())))?;
    file.write_all(&out)
        .map_err(|e| BenchError::Message(format!("cannot write {}: {e}", path.display())))
}

impl R1csHeader {
    /// A bn128 header with the given constraint and wire counts.
    pub fn bn128(n_constraints: u32, n_wires: u32) -> Self {
        R1csHeader {
            field_size: 32,
            prime: BN128_PRIME_LE.to_vec(),
            n_wires,
            n_pub_outputs: 0,
            n_pub_inputs: 0,
            n_prv_inputs: 0,
            n_labels: n_wires as u64,
            n_constraints,
        }
    }
}

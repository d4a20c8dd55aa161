//! Raw persistence for ring elements and scheme parameters.
//!
//! A scalar record is the little-endian magnitude of a big integer behind
//! a u64 little-endian byte-length prefix; a vector record is a u64 count
//! followed by that many scalars. Round-trips are exact. Public parameters
//! persist as three named records (`nu`, `x0`, `pzt`) in a directory, the
//! full secret state as six.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use num_bigint::BigUint;

use crate::crt::CrtTree;
use crate::error::{CltError, Result};
use crate::params::CltParams;
use crate::rng::EncodingRng;
use crate::state::CltState;
use crate::zero_test::PublicParams;

/// Encode one big integer as a length-prefixed byte record.
fn scalar_record(value: &BigUint) -> Vec<u8> {
    let bytes = value.to_bytes_le();
    let mut buf = Vec::with_capacity(8 + bytes.len());
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(&bytes);
    buf
}

/// Write one big integer to `sink`.
pub fn save_scalar<W: Write>(sink: &mut W, value: &BigUint) -> Result<()> {
    sink.write_all(&scalar_record(value))?;
    Ok(())
}

/// Read one big integer from `source`. A truncated record surfaces as an
/// I/O error.
pub fn load_scalar<R: Read>(source: &mut R) -> Result<BigUint> {
    let mut len_buf = [0u8; 8];
    source.read_exact(&mut len_buf)?;
    let len = u64::from_le_bytes(len_buf) as usize;
    let mut bytes = vec![0u8; len];
    source.read_exact(&mut bytes)?;
    Ok(BigUint::from_bytes_le(&bytes))
}

/// Write a fixed-length ordered sequence of big integers to `sink`.
pub fn save_vector<W: Write>(sink: &mut W, values: &[BigUint]) -> Result<()> {
    sink.write_all(&(values.len() as u64).to_le_bytes())?;
    for value in values {
        save_scalar(sink, value)?;
    }
    Ok(())
}

/// Read a sequence of big integers from `source`, preserving order.
pub fn load_vector<R: Read>(source: &mut R) -> Result<Vec<BigUint>> {
    let mut len_buf = [0u8; 8];
    source.read_exact(&mut len_buf)?;
    let len = u64::from_le_bytes(len_buf) as usize;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(load_scalar(source)?);
    }
    Ok(out)
}

fn vector_record(values: &[BigUint]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(values.len() as u64).to_le_bytes());
    for value in values {
        buf.extend_from_slice(&scalar_record(value));
    }
    buf
}

/// Stage every record as a temporary, then rename. A failure before the
/// rename pass leaves the existing records untouched.
fn commit_records(dir: &Path, records: &[(&str, Vec<u8>)]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (name, bytes) in records {
        fs::write(dir.join(format!("{}.tmp", name)), bytes)?;
    }
    for (name, _) in records {
        fs::rename(dir.join(format!("{}.tmp", name)), dir.join(name))?;
    }
    Ok(())
}

fn malformed(what: &str) -> CltError {
    CltError::Io(io::Error::new(io::ErrorKind::InvalidData, what.to_string()))
}

impl PublicParams {
    /// Persist as the named records `nu` (decimal text), `x0`, `pzt`.
    ///
    /// All-or-nothing: records are staged and only renamed into place once
    /// every write succeeded.
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        commit_records(
            dir,
            &[
                ("nu", self.nu.to_string().into_bytes()),
                ("x0", scalar_record(&self.x0)),
                ("pzt", scalar_record(&self.pzt)),
            ],
        )
    }

    /// Load a parameter set previously written by
    /// [`save_to_dir`](Self::save_to_dir).
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let nu = fs::read_to_string(dir.join("nu"))?
            .trim()
            .parse::<u64>()
            .map_err(|_| malformed("nu record is not a decimal integer"))?;
        let x0 = load_scalar(&mut fs::File::open(dir.join("x0"))?)?;
        let pzt = load_scalar(&mut fs::File::open(dir.join("pzt"))?)?;
        Ok(Self { x0, pzt, nu })
    }
}

impl CltState {
    /// Persist the full secret state under `dir`.
    ///
    /// Writes the derivation inputs as decimal text plus the `x0`, `pzt`
    /// scalars and the `ps`, `gs`, `zinvs` vectors, staged like the public
    /// records. The random source is not persisted; loading reseeds from
    /// OS entropy.
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        let ps: Vec<BigUint> = self.crt.leaf_moduli().into_iter().cloned().collect();
        commit_records(
            dir,
            &[
                (
                    "params",
                    format!(
                        "{} {} {}\n",
                        self.params.lambda, self.params.kappa, self.params.nzs
                    )
                    .into_bytes(),
                ),
                ("x0", scalar_record(&self.x0)),
                ("pzt", scalar_record(&self.pzt)),
                ("ps", vector_record(&ps)),
                ("gs", vector_record(&self.gs)),
                ("zinvs", vector_record(&self.zinvs)),
            ],
        )
    }

    /// Load a state previously written by [`save_to_dir`](Self::save_to_dir),
    /// rebuilding the CRT tree from the persisted primes.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let text = fs::read_to_string(dir.join("params"))?;
        let mut fields = text.split_whitespace();
        let mut next = |what: &str| -> Result<u64> {
            fields
                .next()
                .and_then(|f| f.parse::<u64>().ok())
                .ok_or_else(|| malformed(what))
        };
        let lambda = next("params record is missing lambda")?;
        let kappa = next("params record is missing kappa")?;
        let nzs = next("params record is missing nzs")? as usize;
        let params = CltParams::derive(lambda, kappa, nzs)?;

        let x0 = load_scalar(&mut fs::File::open(dir.join("x0"))?)?;
        let pzt = load_scalar(&mut fs::File::open(dir.join("pzt"))?)?;
        let ps = load_vector(&mut fs::File::open(dir.join("ps"))?)?;
        let gs = load_vector(&mut fs::File::open(dir.join("gs"))?)?;
        let zinvs = load_vector(&mut fs::File::open(dir.join("zinvs"))?)?;

        if ps.len() != params.n || gs.len() != params.n {
            return Err(malformed("prime or generator vector length mismatch"));
        }
        if zinvs.len() != params.nzs {
            return Err(malformed("zero-test inverse vector length mismatch"));
        }

        let crt = CrtTree::build(&ps)?;
        if *crt.modulus() != x0 {
            return Err(malformed("master modulus does not match prime product"));
        }

        let rng = EncodingRng::from_entropy()?;
        Ok(Self {
            params,
            x0,
            pzt,
            gs,
            zinvs,
            crt,
            rng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "clt_engine_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_scalar_round_trip() {
        let rng = EncodingRng::from_seed([21u8; 32]);
        for bits in [0u64, 1, 7, 64, 255, 4096] {
            let value = rng.random_bits(bits);
            let mut buf = Vec::new();
            save_scalar(&mut buf, &value).unwrap();
            let back = load_scalar(&mut Cursor::new(buf)).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_vector_round_trip() {
        let rng = EncodingRng::from_seed([22u8; 32]);
        let values: Vec<BigUint> = (0..17).map(|_| rng.random_bits(300)).collect();
        let mut buf = Vec::new();
        save_vector(&mut buf, &values).unwrap();
        let back = load_vector(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_truncated_scalar_is_an_error() {
        let mut buf = Vec::new();
        save_scalar(&mut buf, &BigUint::from(0xdead_beefu32)).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(load_scalar(&mut Cursor::new(buf)).is_err());
    }

    #[test]
    fn test_public_params_round_trip() {
        let state = CltState::generate(2, 8, 2, &[1, 1]).unwrap();
        let pp = state.public_params();
        let dir = scratch_dir("pp");
        pp.save_to_dir(&dir).unwrap();
        let back = PublicParams::load_from_dir(&dir).unwrap();
        assert_eq!(back, pp);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_public_params_record_names() {
        let state = CltState::generate(2, 8, 2, &[1, 1]).unwrap();
        let dir = scratch_dir("pp_names");
        state.public_params().save_to_dir(&dir).unwrap();
        for name in ["nu", "x0", "pzt"] {
            assert!(dir.join(name).exists(), "missing record {}", name);
            assert!(!dir.join(format!("{}.tmp", name)).exists());
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_state_round_trip() {
        let state = CltState::generate(2, 8, 2, &[1, 1]).unwrap();
        let dir = scratch_dir("state");
        state.save_to_dir(&dir).unwrap();
        let back = CltState::load_from_dir(&dir).unwrap();
        assert_eq!(back.modulus(), state.modulus());
        assert_eq!(back.slot_generators(), state.slot_generators());
        assert_eq!(back.params(), state.params());
        assert_eq!(back.public_params(), state.public_params());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_record_is_an_error() {
        let dir = scratch_dir("missing");
        fs::create_dir_all(&dir).unwrap();
        assert!(PublicParams::load_from_dir(&dir).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}

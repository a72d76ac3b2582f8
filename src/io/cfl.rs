//! Complex arrays as `.hdr`/`.cfl` file pairs.
//!
//! The header is a small text file whose `# Dimensions` line lists the
//! extents of the 16 axes; the data file holds the samples as little-endian
//! `f32` (re, im) pairs in column-major order. The layout is compatible with
//! the memory-mapped files produced by the usual MRI reconstruction
//! toolchains.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use itertools::Itertools;

use crate::array::ComplexArray;
use crate::dims::{total, Dims, DIMS};
use crate::error::Error;
use crate::Complexf32;

/// Load the array stored as `base.hdr` + `base.cfl`
pub fn load_cfl(base: &Path) -> Result<ComplexArray, Error> {
    let dims = read_header(&base.with_extension("hdr"))?;

    let file = File::open(base.with_extension("cfl"))?;
    let mut buf = BufReader::new(file);
    let mut bytes = [0; 4];
    let mut floats = Vec::with_capacity(2 * total(&dims));
    loop {
        use std::io::ErrorKind::UnexpectedEof;
        match buf.read_exact(&mut bytes) {
            Ok(()) => floats.push(f32::from_le_bytes(bytes)),
            Err(e) if e.kind() == UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }

    if floats.len() != 2 * total(&dims) {
        return Err(Error::BadHeader(format!(
            "{:?}: header promises {} samples but the data file holds {}",
            base, total(&dims), floats.len() / 2
        )));
    }

    let data = floats.into_iter()
        .tuples()
        .map(|(re, im)| Complexf32::new(re, im))
        .collect();
    ComplexArray::from_vec(dims, data)
}

/// Store the array as `base.hdr` + `base.cfl`
pub fn write_cfl(base: &Path, array: &ComplexArray) -> Result<(), Error> {
    let dims = array.dims();
    let header = format!("# Dimensions\n{}\n", dims.iter().join(" "));
    fs::write(base.with_extension("hdr"), header)?;

    let file = File::create(base.with_extension("cfl"))?;
    let mut buf = BufWriter::new(file);
    for z in array.as_slice() {
        buf.write_all(&z.re.to_le_bytes())?;
        buf.write_all(&z.im.to_le_bytes())?;
    }
    Ok(())
}

fn read_header(path: &Path) -> Result<Dims, Error> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines();
    loop {
        match lines.next() {
            Some(line) if line.trim_start().starts_with("# Dimensions") => break,
            Some(_) => continue,
            None => return Err(Error::BadHeader(format!("{:?}: no '# Dimensions' line", path))),
        }
    }
    let line = lines.next()
        .ok_or_else(|| Error::BadHeader(format!("{:?}: missing dimension extents", path)))?;

    let extents: Vec<usize> = line.split_whitespace()
        .map(str::parse)
        .try_collect()
        .map_err(|e| Error::BadHeader(format!("{:?}: {}", path, e)))?;
    if extents.is_empty() || extents.len() > DIMS {
        return Err(Error::BadHeader(format!(
            "{:?}: expected between 1 and {} extents, found {}", path, DIMS, extents.len()
        )));
    }

    // trailing axes default to extent 1
    let mut dims = [1; DIMS];
    dims[..extents.len()].copy_from_slice(&extents);
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims::dims_from;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn cfl_roundtrip() -> Result<(), Error> {
        use tempfile::tempdir;

        let dir = tempdir()?;
        let base = dir.path().join("ksp");

        let dims = dims_from([2, 3]);
        let original = ComplexArray::from_vec(
            dims,
            (0..6).map(|i| Complexf32::new(i as f32, -(i as f32) / 2.0)).collect(),
        )?;

        write_cfl(&base, &original)?;
        let reloaded = load_cfl(&base)?;

        assert_eq!(reloaded.dims(), original.dims());
        assert_eq!(reloaded.as_slice(), original.as_slice());
        Ok(())
    }

    #[test]
    fn short_data_file_is_rejected() -> Result<(), Error> {
        use tempfile::tempdir;

        let dir = tempdir()?;
        let base = dir.path().join("broken");
        write_cfl(&base, &ComplexArray::zeros(dims_from([4])))?;

        // claim more samples than the data file holds
        fs::write(base.with_extension("hdr"), "# Dimensions\n8 1 1 1 1\n")?;
        assert!(matches!(load_cfl(&base), Err(Error::BadHeader(_))));
        Ok(())
    }

    #[test]
    fn header_without_dimensions_line_is_rejected() -> Result<(), Error> {
        use tempfile::tempdir;

        let dir = tempdir()?;
        let base = dir.path().join("empty");
        fs::write(base.with_extension("hdr"), "# Nothing useful\n")?;
        fs::write(base.with_extension("cfl"), [])?;
        assert!(matches!(load_cfl(&base), Err(Error::BadHeader(_))));
        Ok(())
    }
}

use crate::error::LoadError;
use ::std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use brotli::Decompressor;

const BUFFER_SIZE: usize = 1 << 16;

/// Opens an ARPA file, `.br` files are brotli decompressed on the fly
pub(super) fn open(path: &Path) -> Result<Box<dyn BufRead>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_owned(),
        source,
    })?;

    if path.extension().is_some_and(|ext| ext == "br") {
        let decompressor = Decompressor::new(file, 4096);
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, decompressor)))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::std::io::Read;

    #[test]
    fn test_open_missing_file() {
        let res = open(Path::new("does/not/exist.arpa"));
        assert!(matches!(res, Err(LoadError::Open { .. })));
    }

    #[test]
    fn test_open_compressed() {
        let text = "\\data\\\nngram 1=1\n\n\\1-grams:\n-1\tque\n\n\\end\\\n";
        let path = ::std::env::temp_dir().join(format!(
            "ngram_trie_source_{}.arpa.br",
            ::std::process::id()
        ));
        {
            let file = File::create(&path).unwrap();
            let mut writer = brotli::CompressorWriter::new(file, 4096, 9, 22);
            ::std::io::Write::write_all(&mut writer, text.as_bytes()).unwrap();
        }

        let mut content = String::new();
        open(&path).unwrap().read_to_string(&mut content).unwrap();
        ::std::fs::remove_file(&path).unwrap();
        assert_eq!(content, text);
    }
}

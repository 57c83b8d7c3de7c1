use anyhow::Result;
use bytes::Bytes;

/// Compression formats detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Bzip2,
    Xz,
    Uncompressed,
}

/// Magic byte detection and decompression for fetched playlists
///
/// Some playlist hosts serve `.m3u.gz` files without a `Content-Encoding`
/// header, so bodies are sniffed rather than trusted.
pub struct DecompressionService;

impl DecompressionService {
    /// Detect compression format using magic bytes
    pub fn detect_compression_format(data: &[u8]) -> CompressionFormat {
        match infer::get(data).map(|kind| kind.mime_type()) {
            Some("application/gzip") => CompressionFormat::Gzip,
            Some("application/x-bzip2") => CompressionFormat::Bzip2,
            Some("application/x-xz") => CompressionFormat::Xz,
            _ => CompressionFormat::Uncompressed,
        }
    }

    /// Decompress data based on detected format
    pub fn decompress(data: Bytes) -> Result<Vec<u8>> {
        match Self::detect_compression_format(&data) {
            CompressionFormat::Gzip => Self::decompress_gzip(data),
            CompressionFormat::Bzip2 => Self::decompress_bzip2(data),
            CompressionFormat::Xz => Self::decompress_xz(data),
            CompressionFormat::Uncompressed => Ok(data.to_vec()),
        }
    }

    #[cfg(feature = "compression-gzip")]
    fn decompress_gzip(data: Bytes) -> Result<Vec<u8>> {
        use anyhow::Context;
        use std::io::Read;

        let mut decoder = flate2::read::GzDecoder::new(data.as_ref());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .context("Failed to decompress gzip data")?;
        Ok(decompressed)
    }

    #[cfg(not(feature = "compression-gzip"))]
    fn decompress_gzip(_data: Bytes) -> Result<Vec<u8>> {
        anyhow::bail!("gzip support not compiled in (enable the compression-gzip feature)")
    }

    #[cfg(feature = "compression-bzip2")]
    fn decompress_bzip2(data: Bytes) -> Result<Vec<u8>> {
        use anyhow::Context;
        use std::io::Read;

        let mut decoder = bzip2::read::BzDecoder::new(data.as_ref());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .context("Failed to decompress bzip2 data")?;
        Ok(decompressed)
    }

    #[cfg(not(feature = "compression-bzip2"))]
    fn decompress_bzip2(_data: Bytes) -> Result<Vec<u8>> {
        anyhow::bail!("bzip2 support not compiled in (enable the compression-bzip2 feature)")
    }

    #[cfg(feature = "compression-xz")]
    fn decompress_xz(data: Bytes) -> Result<Vec<u8>> {
        use anyhow::Context;
        use std::io::Read;

        let mut decoder = xz2::read::XzDecoder::new(data.as_ref());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .context("Failed to decompress xz data")?;
        Ok(decompressed)
    }

    #[cfg(not(feature = "compression-xz"))]
    fn decompress_xz(_data: Bytes) -> Result<Vec<u8>> {
        anyhow::bail!("xz support not compiled in (enable the compression-xz feature)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_uncompressed() {
        let data = b"#EXTM3U\n#EXTINF:-1,Channel\nhttp://x/1\n";
        let format = DecompressionService::detect_compression_format(data);
        assert_eq!(format, CompressionFormat::Uncompressed);
    }

    #[test]
    fn test_decompress_uncompressed() {
        let data = b"#EXTM3U\n";
        let result = DecompressionService::decompress(Bytes::from(data.as_ref())).unwrap();
        assert_eq!(result, data);
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn test_detect_and_decompress_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original_data = b"#EXTM3U\n#EXTINF:-1,Gzipped\nhttp://x/gz\n";

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original_data).unwrap();
        let compressed = encoder.finish().unwrap();

        let format = DecompressionService::detect_compression_format(&compressed);
        assert_eq!(format, CompressionFormat::Gzip);

        let decompressed = DecompressionService::decompress(Bytes::from(compressed)).unwrap();
        assert_eq!(decompressed, original_data);
    }
}

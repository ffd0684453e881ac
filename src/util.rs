use bytes::Bytes;
use crc::{Crc, CRC_32_ISCSI};

pub(crate) const PADDING_MULTIPLE: usize = 4;

pub(crate) fn get_padding_size(len: usize) -> usize {
    (PADDING_MULTIPLE - (len % PADDING_MULTIPLE)) % PADDING_MULTIPLE
}

/// Allocate and zero this data once.
/// We need to use it for the checksum and don't want to allocate/clear each time.
pub(crate) static FOUR_ZEROES: Bytes = Bytes::from_static(&[0, 0, 0, 0]);

pub(crate) const ISCSI_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Computes the RFC 4960 packet checksum, treating the checksum field
/// (offsets 8..12 of the common header) as zero.
pub(crate) fn generate_packet_checksum(raw: &[u8]) -> u32 {
    let mut digest = ISCSI_CRC.digest();
    digest.update(&raw[0..8]);
    digest.update(&FOUR_ZEROES[..]);
    digest.update(&raw[12..]);
    digest.finalize()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_padding_size() {
        let tests = vec![(0, 0), (1, 3), (2, 2), (3, 1), (4, 0), (5, 3), (8, 0)];
        for (len, expected) in tests {
            assert_eq!(get_padding_size(len), expected, "padding of len {len}");
        }
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let mut with_checksum = vec![
            0x13, 0x88, 0x13, 0x88, 0x00, 0x00, 0x00, 0x00, 0xaa, 0xbb, 0xcc, 0xdd,
        ];
        let zeroed: Vec<u8> = {
            let mut z = with_checksum.clone();
            z[8..12].copy_from_slice(&[0, 0, 0, 0]);
            z
        };
        assert_eq!(
            generate_packet_checksum(&with_checksum),
            generate_packet_checksum(&zeroed)
        );

        // and it must match a plain CRC32c over the zeroed buffer
        let mut digest = ISCSI_CRC.digest();
        digest.update(&zeroed);
        assert_eq!(generate_packet_checksum(&with_checksum), digest.finalize());

        with_checksum[0] = 0x14;
        assert_ne!(
            generate_packet_checksum(&with_checksum),
            generate_packet_checksum(&zeroed)
        );
    }
}

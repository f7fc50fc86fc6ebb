// Write-side LEB128, following the scheme used by
// https://doc.rust-lang.org/stable/nightly-rustc/src/rustc_serialize/leb128.rs.html

use byteorder::{LittleEndian, WriteBytesExt};

pub fn write_u32(out: &mut Vec<u8>, mut value: u32) {
    loop {
        if value < 0x80 {
            out.push(value as u8);
            break;
        }
        out.push(((value & 0x7f) | 0x80) as u8);
        value >>= 7;
    }
}

pub fn write_s32(out: &mut Vec<u8>, mut value: i32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

/// Not LEB128: `f64.const` immediates are 8 raw little-endian bytes.
pub fn write_f64(out: &mut Vec<u8>, value: f64) {
    out.write_f64::<LittleEndian>(value)
        .expect("write should not fail");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_bytes(value: u32) -> Vec<u8> {
        let mut out = vec![];
        write_u32(&mut out, value);
        out
    }

    fn s32_bytes(value: i32) -> Vec<u8> {
        let mut out = vec![];
        write_s32(&mut out, value);
        out
    }

    #[test]
    fn unsigned() {
        assert_eq!(vec![0x00], u32_bytes(0));
        assert_eq!(vec![0x7f], u32_bytes(127));
        assert_eq!(vec![0x80, 0x01], u32_bytes(128));
        assert_eq!(vec![0xe5, 0x8e, 0x26], u32_bytes(624_485));
        assert_eq!(vec![0xff, 0xff, 0xff, 0xff, 0x0f], u32_bytes(u32::MAX));
    }

    #[test]
    fn signed() {
        assert_eq!(vec![0x00], s32_bytes(0));
        assert_eq!(vec![0x3f], s32_bytes(63));
        assert_eq!(vec![0xc0, 0x00], s32_bytes(64));
        assert_eq!(vec![0x40], s32_bytes(-64));
        assert_eq!(vec![0x7f], s32_bytes(-1));
        assert_eq!(vec![0xbf, 0x7f], s32_bytes(-65));
    }

    #[test]
    fn floats_are_raw_little_endian() {
        let mut out = vec![];
        write_f64(&mut out, 1.0);
        assert_eq!(vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f], out);
    }
}

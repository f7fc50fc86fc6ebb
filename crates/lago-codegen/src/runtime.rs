//! The runtime support functions compiled into every module.
//!
//! Every lago value is a 16-byte heap cell: an i32 tag at offset 0, an i32
//! payload at offset 4 (string data offset, or bool value), and either an
//! f64 at offset 8 (numbers) or a second i32 at offset 8 (string length).
//! Generated code only ever passes around i32 pointers to these cells; the
//! helpers here box, unbox, test, and combine them.
//!
//! Function indices are fixed: the two imports come first, then `main`, then
//! the helpers in the order of the constants below, then user functions.

use crate::{
    func::FuncBuilder,
    module::FuncType,
    opcode::{BlockType, Opcode, ValType},
};

pub const PRINT: u32 = 0;
pub const PRINTLN: u32 = 1;
pub const MAIN: u32 = 2;

pub const BOX_NUMBER: u32 = 3;
// Generated code reaches numbers through the coercing `to_number`, but the
// raw unboxing helper stays part of the suite at this index.
#[allow(dead_code)]
pub const UNBOX_NUMBER: u32 = 4;
pub const BOX_BOOL: u32 = 5;
pub const BOX_STRING: u32 = 6;
pub const BOX_NIL: u32 = 7;
pub const IS_TRUTHY: u32 = 8;
pub const TO_NUMBER: u32 = 9;
pub const NUM_MOD: u32 = 10;
pub const NUM_POW: u32 = 11;
pub const ENSURE_SPACE: u32 = 12;
pub const COPY_BYTES: u32 = 13;
pub const NUM_TO_STR: u32 = 14;
pub const TO_STR: u32 = 15;
pub const CONCAT: u32 = 16;
pub const ADD_VALUES: u32 = 17;

/// Index of the first user-declared function.
pub const FIRST_USER: u32 = 18;

/// The heap pointer global.
pub const HEAP: u32 = 0;

pub const TAG_NIL: i32 = 0;
pub const TAG_NUMBER: i32 = 1;
pub const TAG_STRING: i32 = 2;
pub const TAG_BOOL: i32 = 3;

/// Size of one boxed cell.
pub const BOX_SIZE: i32 = 16;

const PAGE_SIZE: i32 = 65536;

/// Build the helper suite, in function-index order starting at
/// [`BOX_NUMBER`]. Each entry is the function's signature and finished body.
pub fn helpers() -> Vec<(FuncType, Vec<u8>)> {
    vec![
        box_number(),
        unbox_number(),
        box_bool(),
        box_string(),
        box_nil(),
        is_truthy(),
        to_number(),
        num_mod(),
        num_pow(),
        ensure_space(),
        copy_bytes(),
        num_to_str(),
        to_str(),
        concat(),
        add_values(),
    ]
}

/// `box_number(x: f64) -> i32`
fn box_number() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let ptr = 1;
    f.i32_const(BOX_SIZE);
    f.call(ENSURE_SPACE);
    f.global_get(HEAP);
    f.local_tee(ptr);
    f.i32_const(TAG_NUMBER);
    f.i32_store(0);
    f.local_get(ptr);
    f.local_get(0);
    f.f64_store(8);
    f.local_get(ptr);
    f.i32_const(BOX_SIZE);
    f.op(Opcode::I32Add);
    f.global_set(HEAP);
    f.local_get(ptr);
    (
        FuncType::new(vec![ValType::F64], vec![ValType::I32]),
        f.finish(&[(1, ValType::I32)]),
    )
}

/// `unbox_number(p: i32) -> f64`. Undefined for non-number tags.
fn unbox_number() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    f.local_get(0);
    f.f64_load(8);
    (
        FuncType::new(vec![ValType::I32], vec![ValType::F64]),
        f.finish(&[]),
    )
}

/// `box_bool(v: i32) -> i32`
fn box_bool() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let ptr = 1;
    f.i32_const(BOX_SIZE);
    f.call(ENSURE_SPACE);
    f.global_get(HEAP);
    f.local_tee(ptr);
    f.i32_const(TAG_BOOL);
    f.i32_store(0);
    f.local_get(ptr);
    f.local_get(0);
    f.i32_store(4);
    f.local_get(ptr);
    f.i32_const(BOX_SIZE);
    f.op(Opcode::I32Add);
    f.global_set(HEAP);
    f.local_get(ptr);
    (
        FuncType::new(vec![ValType::I32], vec![ValType::I32]),
        f.finish(&[(1, ValType::I32)]),
    )
}

/// `box_string(offset: i32, len: i32) -> i32`
fn box_string() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let ptr = 2;
    f.i32_const(BOX_SIZE);
    f.call(ENSURE_SPACE);
    f.global_get(HEAP);
    f.local_tee(ptr);
    f.i32_const(TAG_STRING);
    f.i32_store(0);
    f.local_get(ptr);
    f.local_get(0);
    f.i32_store(4);
    f.local_get(ptr);
    f.local_get(1);
    f.i32_store(8);
    f.local_get(ptr);
    f.i32_const(BOX_SIZE);
    f.op(Opcode::I32Add);
    f.global_set(HEAP);
    f.local_get(ptr);
    (
        FuncType::new(vec![ValType::I32, ValType::I32], vec![ValType::I32]),
        f.finish(&[(1, ValType::I32)]),
    )
}

/// `box_nil() -> i32`
fn box_nil() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let ptr = 0;
    f.i32_const(BOX_SIZE);
    f.call(ENSURE_SPACE);
    f.global_get(HEAP);
    f.local_tee(ptr);
    f.i32_const(TAG_NIL);
    f.i32_store(0);
    f.local_get(ptr);
    f.i32_const(BOX_SIZE);
    f.op(Opcode::I32Add);
    f.global_set(HEAP);
    f.local_get(ptr);
    (
        FuncType::new(vec![], vec![ValType::I32]),
        f.finish(&[(1, ValType::I32)]),
    )
}

/// `is_truthy(p: i32) -> i32`. Nil, `false`, `0`, and `""` are falsy;
/// everything else is truthy.
fn is_truthy() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let tag = 1;
    f.local_get(0);
    f.i32_load(0);
    f.local_tee(tag);
    f.i32_const(TAG_NUMBER);
    f.op(Opcode::I32Eq);
    f.if_(BlockType::I32);
    {
        f.local_get(0);
        f.f64_load(8);
        f.f64_const(0.0);
        f.op(Opcode::F64Ne);
    }
    f.else_();
    {
        f.local_get(tag);
        f.i32_const(TAG_STRING);
        f.op(Opcode::I32Eq);
        f.if_(BlockType::I32);
        {
            f.local_get(0);
            f.i32_load(8);
            f.i32_const(0);
            f.op(Opcode::I32Ne);
        }
        f.else_();
        {
            f.local_get(tag);
            f.i32_const(TAG_BOOL);
            f.op(Opcode::I32Eq);
            f.if_(BlockType::I32);
            {
                f.local_get(0);
                f.i32_load(4);
            }
            f.else_();
            {
                f.i32_const(0);
            }
            f.end();
        }
        f.end();
    }
    f.end();
    (
        FuncType::new(vec![ValType::I32], vec![ValType::I32]),
        f.finish(&[(1, ValType::I32)]),
    )
}

/// `to_number(p: i32) -> f64`. Numbers unbox, bools coerce to 0/1,
/// everything else is 0.
fn to_number() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let tag = 1;
    f.local_get(0);
    f.i32_load(0);
    f.local_tee(tag);
    f.i32_const(TAG_NUMBER);
    f.op(Opcode::I32Eq);
    f.if_(BlockType::F64);
    {
        f.local_get(0);
        f.f64_load(8);
    }
    f.else_();
    {
        f.local_get(tag);
        f.i32_const(TAG_BOOL);
        f.op(Opcode::I32Eq);
        f.if_(BlockType::F64);
        {
            f.local_get(0);
            f.i32_load(4);
            f.op(Opcode::F64ConvertI32S);
        }
        f.else_();
        {
            f.f64_const(0.0);
        }
        f.end();
    }
    f.end();
    (
        FuncType::new(vec![ValType::I32], vec![ValType::F64]),
        f.finish(&[(1, ValType::I32)]),
    )
}

/// `num_mod(a: f64, b: f64) -> f64`, computed as `a - trunc(a/b)*b`.
/// Division by zero falls out as NaN.
fn num_mod() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    f.local_get(0);
    f.local_get(0);
    f.local_get(1);
    f.op(Opcode::F64Div);
    f.op(Opcode::F64Trunc);
    f.local_get(1);
    f.op(Opcode::F64Mul);
    f.op(Opcode::F64Sub);
    (
        FuncType::new(vec![ValType::F64, ValType::F64], vec![ValType::F64]),
        f.finish(&[]),
    )
}

/// `num_pow(base: f64, exp: f64) -> f64`: iterative multiplication over the
/// exponent truncated to an integer. A negative exponent inverts the base.
fn num_pow() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let result = 2;
    let n = 3;
    f.local_get(1);
    f.op(Opcode::I32TruncF64S);
    f.local_set(n);
    f.local_get(n);
    f.i32_const(0);
    f.op(Opcode::I32LtS);
    f.if_(BlockType::Void);
    {
        f.f64_const(1.0);
        f.local_get(0);
        f.op(Opcode::F64Div);
        f.local_set(0);
        f.i32_const(0);
        f.local_get(n);
        f.op(Opcode::I32Sub);
        f.local_set(n);
    }
    f.end();
    f.f64_const(1.0);
    f.local_set(result);
    f.block(BlockType::Void);
    {
        f.loop_(BlockType::Void);
        {
            f.local_get(n);
            f.op(Opcode::I32Eqz);
            f.br_if(1);
            f.local_get(result);
            f.local_get(0);
            f.op(Opcode::F64Mul);
            f.local_set(result);
            f.local_get(n);
            f.i32_const(1);
            f.op(Opcode::I32Sub);
            f.local_set(n);
            f.br(0);
        }
        f.end();
    }
    f.end();
    f.local_get(result);
    (
        FuncType::new(vec![ValType::F64, ValType::F64], vec![ValType::F64]),
        f.finish(&[(1, ValType::F64), (1, ValType::I32)]),
    )
}

/// `ensure_space(n: i32)`: grow memory by `ceil(n / page)` pages when the
/// heap pointer would run past the current memory size. A failed grow
/// executes `unreachable`.
fn ensure_space() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    f.global_get(HEAP);
    f.local_get(0);
    f.op(Opcode::I32Add);
    f.memory_size();
    f.i32_const(PAGE_SIZE);
    f.op(Opcode::I32Mul);
    f.op(Opcode::I32GtU);
    f.if_(BlockType::Void);
    {
        f.local_get(0);
        f.i32_const(PAGE_SIZE - 1);
        f.op(Opcode::I32Add);
        f.i32_const(PAGE_SIZE);
        f.op(Opcode::I32DivU);
        f.memory_grow();
        f.i32_const(-1);
        f.op(Opcode::I32Eq);
        f.if_(BlockType::Void);
        f.op(Opcode::Unreachable);
        f.end();
    }
    f.end();
    (
        FuncType::new(vec![ValType::I32], vec![]),
        f.finish(&[]),
    )
}

/// `copy_bytes(dst: i32, src: i32, len: i32)`
fn copy_bytes() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let i = 3;
    f.block(BlockType::Void);
    {
        f.loop_(BlockType::Void);
        {
            f.local_get(i);
            f.local_get(2);
            f.op(Opcode::I32GeU);
            f.br_if(1);
            f.local_get(0);
            f.local_get(i);
            f.op(Opcode::I32Add);
            f.local_get(1);
            f.local_get(i);
            f.op(Opcode::I32Add);
            f.i32_load8_u(0);
            f.i32_store8(0);
            f.local_get(i);
            f.i32_const(1);
            f.op(Opcode::I32Add);
            f.local_set(i);
            f.br(0);
        }
        f.end();
    }
    f.end();
    (
        FuncType::new(vec![ValType::I32; 3], vec![]),
        f.finish(&[(1, ValType::I32)]),
    )
}

/// `num_to_str(x: f64) -> i32`: format a number into fresh heap bytes and
/// box it as a string. Integer digits come from repeated division by ten
/// (written backwards, then reversed in place); at most six fractional
/// digits follow, with trailing zeros trimmed.
fn num_to_str() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    // i32 locals
    let ptr = 1;
    let p = 2;
    let mark = 3;
    let ch = 4;
    let lo = 5;
    let hi = 6;
    // f64 locals
    let ip = 7;
    let fr = 8;
    let q = 9;

    // NaN never equals itself.
    f.local_get(0);
    f.local_get(0);
    f.op(Opcode::F64Ne);
    f.if_(BlockType::Void);
    {
        f.i32_const(3 + BOX_SIZE);
        f.call(ENSURE_SPACE);
        f.global_get(HEAP);
        f.local_tee(ptr);
        f.i32_const(b'n' as i32);
        f.i32_store8(0);
        f.local_get(ptr);
        f.i32_const(b'a' as i32);
        f.i32_store8(1);
        f.local_get(ptr);
        f.i32_const(b'n' as i32);
        f.i32_store8(2);
        f.local_get(ptr);
        f.i32_const(3);
        f.op(Opcode::I32Add);
        f.global_set(HEAP);
        f.local_get(ptr);
        f.i32_const(3);
        f.call(BOX_STRING);
        f.op(Opcode::Return);
    }
    f.end();

    // Worst case: 309 integer digits, a sign, a dot, and six fraction
    // digits, plus the box allocated afterwards.
    f.i32_const(352);
    f.call(ENSURE_SPACE);
    f.global_get(HEAP);
    f.local_tee(ptr);
    f.local_set(p);

    // Sign.
    f.local_get(0);
    f.f64_const(0.0);
    f.op(Opcode::F64Lt);
    f.if_(BlockType::Void);
    {
        f.local_get(p);
        f.i32_const(b'-' as i32);
        f.i32_store8(0);
        f.local_get(p);
        f.i32_const(1);
        f.op(Opcode::I32Add);
        f.local_set(p);
        f.local_get(0);
        f.op(Opcode::F64Neg);
        f.local_set(0);
    }
    f.end();

    f.local_get(0);
    f.f64_const(f64::INFINITY);
    f.op(Opcode::F64Eq);
    f.if_(BlockType::Void);
    {
        for (i, b) in b"inf".iter().enumerate() {
            f.local_get(p);
            f.i32_const(*b as i32);
            f.i32_store8(i as u32);
        }
        f.local_get(p);
        f.i32_const(3);
        f.op(Opcode::I32Add);
        f.local_set(p);
    }
    f.else_();
    {
        // ip = floor(x), fr = x - ip
        f.local_get(0);
        f.op(Opcode::F64Floor);
        f.local_set(ip);
        f.local_get(0);
        f.local_get(ip);
        f.op(Opcode::F64Sub);
        f.local_set(fr);

        // Integer digits, least significant first.
        f.local_get(p);
        f.local_set(lo);
        f.loop_(BlockType::Void);
        {
            f.local_get(ip);
            f.f64_const(10.0);
            f.op(Opcode::F64Div);
            f.op(Opcode::F64Floor);
            f.local_set(q);
            f.local_get(ip);
            f.local_get(q);
            f.f64_const(10.0);
            f.op(Opcode::F64Mul);
            f.op(Opcode::F64Sub);
            f.op(Opcode::I32TruncF64S);
            f.i32_const(b'0' as i32);
            f.op(Opcode::I32Add);
            f.local_set(ch);
            f.local_get(p);
            f.local_get(ch);
            f.i32_store8(0);
            f.local_get(p);
            f.i32_const(1);
            f.op(Opcode::I32Add);
            f.local_set(p);
            f.local_get(q);
            f.local_set(ip);
            f.local_get(ip);
            f.f64_const(1.0);
            f.op(Opcode::F64Ge);
            f.br_if(0);
        }
        f.end();

        // Reverse the digits in place.
        f.local_get(p);
        f.i32_const(1);
        f.op(Opcode::I32Sub);
        f.local_set(hi);
        f.block(BlockType::Void);
        {
            f.loop_(BlockType::Void);
            {
                f.local_get(lo);
                f.local_get(hi);
                f.op(Opcode::I32GeU);
                f.br_if(1);
                f.local_get(lo);
                f.i32_load8_u(0);
                f.local_set(ch);
                f.local_get(lo);
                f.local_get(hi);
                f.i32_load8_u(0);
                f.i32_store8(0);
                f.local_get(hi);
                f.local_get(ch);
                f.i32_store8(0);
                f.local_get(lo);
                f.i32_const(1);
                f.op(Opcode::I32Add);
                f.local_set(lo);
                f.local_get(hi);
                f.i32_const(1);
                f.op(Opcode::I32Sub);
                f.local_set(hi);
                f.br(0);
            }
            f.end();
        }
        f.end();

        // Fraction digits. `mark` trails the last nonzero digit written, so
        // trailing zeros (and a fruitless dot) are dropped at the end.
        f.local_get(fr);
        f.f64_const(0.0);
        f.op(Opcode::F64Gt);
        f.if_(BlockType::Void);
        {
            f.local_get(p);
            f.local_set(mark);
            f.local_get(p);
            f.i32_const(b'.' as i32);
            f.i32_store8(0);
            f.local_get(p);
            f.i32_const(1);
            f.op(Opcode::I32Add);
            f.local_set(p);
            f.i32_const(0);
            f.local_set(lo);
            f.block(BlockType::Void);
            {
                f.loop_(BlockType::Void);
                {
                    f.local_get(lo);
                    f.i32_const(6);
                    f.op(Opcode::I32GeU);
                    f.br_if(1);
                    f.local_get(fr);
                    f.f64_const(10.0);
                    f.op(Opcode::F64Mul);
                    f.local_set(fr);
                    f.local_get(fr);
                    f.op(Opcode::F64Floor);
                    f.local_set(q);
                    f.local_get(fr);
                    f.local_get(q);
                    f.op(Opcode::F64Sub);
                    f.local_set(fr);
                    f.local_get(p);
                    f.local_get(q);
                    f.op(Opcode::I32TruncF64S);
                    f.i32_const(b'0' as i32);
                    f.op(Opcode::I32Add);
                    f.i32_store8(0);
                    f.local_get(p);
                    f.i32_const(1);
                    f.op(Opcode::I32Add);
                    f.local_set(p);
                    f.local_get(q);
                    f.f64_const(0.0);
                    f.op(Opcode::F64Ne);
                    f.if_(BlockType::Void);
                    {
                        f.local_get(p);
                        f.local_set(mark);
                    }
                    f.end();
                    f.local_get(lo);
                    f.i32_const(1);
                    f.op(Opcode::I32Add);
                    f.local_set(lo);
                    f.br(0);
                }
                f.end();
            }
            f.end();
            f.local_get(mark);
            f.local_set(p);
        }
        f.end();
    }
    f.end();

    // Advance the heap past the digits and box.
    f.local_get(p);
    f.global_set(HEAP);
    f.local_get(ptr);
    f.local_get(p);
    f.local_get(ptr);
    f.op(Opcode::I32Sub);
    f.call(BOX_STRING);
    (
        FuncType::new(vec![ValType::F64], vec![ValType::I32]),
        f.finish(&[(6, ValType::I32), (3, ValType::F64)]),
    )
}

/// `to_str(p: i32) -> i32`: coerce any boxed value to a boxed string.
/// Strings pass through; numbers format; bools spell out; nil is empty.
fn to_str() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let tag = 1;
    let ptr = 2;
    f.local_get(0);
    f.i32_load(0);
    f.local_tee(tag);
    f.i32_const(TAG_STRING);
    f.op(Opcode::I32Eq);
    f.if_(BlockType::I32);
    {
        f.local_get(0);
    }
    f.else_();
    {
        f.local_get(tag);
        f.i32_const(TAG_NUMBER);
        f.op(Opcode::I32Eq);
        f.if_(BlockType::I32);
        {
            f.local_get(0);
            f.f64_load(8);
            f.call(NUM_TO_STR);
        }
        f.else_();
        {
            f.local_get(tag);
            f.i32_const(TAG_BOOL);
            f.op(Opcode::I32Eq);
            f.if_(BlockType::I32);
            {
                f.local_get(0);
                f.i32_load(4);
                f.if_(BlockType::I32);
                {
                    store_literal(&mut f, ptr, b"true");
                }
                f.else_();
                {
                    store_literal(&mut f, ptr, b"false");
                }
                f.end();
            }
            f.else_();
            {
                f.i32_const(0);
                f.i32_const(0);
                f.call(BOX_STRING);
            }
            f.end();
        }
        f.end();
    }
    f.end();
    (
        FuncType::new(vec![ValType::I32], vec![ValType::I32]),
        f.finish(&[(2, ValType::I32)]),
    )
}

/// Write a fixed byte string at the heap pointer and box it.
fn store_literal(f: &mut FuncBuilder, ptr: u32, bytes: &[u8]) {
    let len = bytes.len() as i32;
    f.i32_const(len + BOX_SIZE);
    f.call(ENSURE_SPACE);
    f.global_get(HEAP);
    f.local_tee(ptr);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            f.local_get(ptr);
        }
        f.i32_const(*b as i32);
        f.i32_store8(i as u32);
    }
    f.local_get(ptr);
    f.i32_const(len);
    f.op(Opcode::I32Add);
    f.global_set(HEAP);
    f.local_get(ptr);
    f.i32_const(len);
    f.call(BOX_STRING);
}

/// `concat(l: i32, r: i32) -> i32`: coerce both operands to strings, copy
/// their bytes into fresh heap space, and box the result.
fn concat() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    let ls = 2;
    let rs = 3;
    let dst = 4;
    let llen = 5;
    let rlen = 6;
    f.local_get(0);
    f.call(TO_STR);
    f.local_set(ls);
    f.local_get(1);
    f.call(TO_STR);
    f.local_set(rs);
    f.local_get(ls);
    f.i32_load(8);
    f.local_set(llen);
    f.local_get(rs);
    f.i32_load(8);
    f.local_set(rlen);
    f.local_get(llen);
    f.local_get(rlen);
    f.op(Opcode::I32Add);
    f.i32_const(BOX_SIZE);
    f.op(Opcode::I32Add);
    f.call(ENSURE_SPACE);
    f.global_get(HEAP);
    f.local_set(dst);
    f.local_get(dst);
    f.local_get(ls);
    f.i32_load(4);
    f.local_get(llen);
    f.call(COPY_BYTES);
    f.local_get(dst);
    f.local_get(llen);
    f.op(Opcode::I32Add);
    f.local_get(rs);
    f.i32_load(4);
    f.local_get(rlen);
    f.call(COPY_BYTES);
    f.local_get(dst);
    f.local_get(llen);
    f.op(Opcode::I32Add);
    f.local_get(rlen);
    f.op(Opcode::I32Add);
    f.global_set(HEAP);
    f.local_get(dst);
    f.local_get(llen);
    f.local_get(rlen);
    f.op(Opcode::I32Add);
    f.call(BOX_STRING);
    (
        FuncType::new(vec![ValType::I32, ValType::I32], vec![ValType::I32]),
        f.finish(&[(5, ValType::I32)]),
    )
}

/// `add_values(l: i32, r: i32) -> i32`: the `+` dispatcher. If either
/// operand is a string the result is a concatenation; otherwise both
/// operands coerce to numbers.
fn add_values() -> (FuncType, Vec<u8>) {
    let mut f = FuncBuilder::new();
    f.local_get(0);
    f.i32_load(0);
    f.i32_const(TAG_STRING);
    f.op(Opcode::I32Eq);
    f.local_get(1);
    f.i32_load(0);
    f.i32_const(TAG_STRING);
    f.op(Opcode::I32Eq);
    f.op(Opcode::I32Or);
    f.if_(BlockType::I32);
    {
        f.local_get(0);
        f.local_get(1);
        f.call(CONCAT);
    }
    f.else_();
    {
        f.local_get(0);
        f.call(TO_NUMBER);
        f.local_get(1);
        f.call(TO_NUMBER);
        f.op(Opcode::F64Add);
        f.call(BOX_NUMBER);
    }
    f.end();
    (
        FuncType::new(vec![ValType::I32, ValType::I32], vec![ValType::I32]),
        f.finish(&[]),
    )
}

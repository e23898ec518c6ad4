#![allow(dead_code)]

use fieldsan_derive::Record;

#[derive(Record)]
enum Mode {
    Fast,
    Slow,
}

fn main() {}

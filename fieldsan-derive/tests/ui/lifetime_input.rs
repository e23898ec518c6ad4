#![allow(dead_code)]

use fieldsan_derive::Record;

#[derive(Record)]
struct Borrowed<'a> {
    name: &'a str,
}

fn main() {}

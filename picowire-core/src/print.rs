//! Text rendering for `Serial::print`
//!
//! Integers render in decimal, floats with two decimals in a six-wide field
//! (the sketch-era `%6.2f`), characters and strings as-is.

use core::ffi::CStr;
use core::fmt::{self, Write};

/// A value `Serial::print` knows how to render
pub trait Printable {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result;
}

impl<T: Printable + ?Sized> Printable for &T {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        (**self).fmt_text(out)
    }
}

macro_rules! impl_printable_int {
    ($($t:ty),*) => {
        $(
            impl Printable for $t {
                fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
                    write!(out, "{}", self)
                }
            }
        )*
    };
}

impl_printable_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Printable for f32 {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        write!(out, "{:6.2}", self)
    }
}

impl Printable for f64 {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        write!(out, "{:6.2}", self)
    }
}

impl Printable for char {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        out.write_char(*self)
    }
}

impl Printable for str {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        out.write_str(self)
    }
}

impl Printable for bool {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        out.write_str(if *self { "1" } else { "0" })
    }
}

impl<const N: usize> Printable for heapless::String<N> {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        out.write_str(self)
    }
}

/// Non-UTF-8 bytes come out as U+FFFD
impl Printable for CStr {
    fn fmt_text(&self, out: &mut dyn Write) -> fmt::Result {
        for chunk in self.to_bytes().utf8_chunks() {
            out.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                out.write_char(char::REPLACEMENT_CHARACTER)?;
            }
        }
        Ok(())
    }
}

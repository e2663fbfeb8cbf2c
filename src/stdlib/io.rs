use super::{Native, NativeFn};

pub const NATIVES: &[Native] = &[
    Native {
        name: "putchard",
        func: NativeFn::Unary(putchard),
    },
    Native {
        name: "printd",
        func: NativeFn::Unary(printd),
    },
];

/// Writes the character with code `x` to stderr and returns 0.
extern "C" fn putchard(x: f64) -> f64 {
    if let Some(c) = char::from_u32(x as u32) {
        eprint!("{}", c);
    }
    0.0
}

/// Writes `x` and a newline to stderr and returns 0.
extern "C" fn printd(x: f64) -> f64 {
    eprintln!("{}", x);
    0.0
}

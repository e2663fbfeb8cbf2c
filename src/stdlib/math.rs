use super::{Native, NativeFn};

pub const NATIVES: &[Native] = &[
    Native {
        name: "sin",
        func: NativeFn::Unary(sin),
    },
    Native {
        name: "cos",
        func: NativeFn::Unary(cos),
    },
    Native {
        name: "tan",
        func: NativeFn::Unary(tan),
    },
    Native {
        name: "sqrt",
        func: NativeFn::Unary(sqrt),
    },
    Native {
        name: "exp",
        func: NativeFn::Unary(exp),
    },
    Native {
        name: "log",
        func: NativeFn::Unary(log),
    },
    Native {
        name: "fabs",
        func: NativeFn::Unary(fabs),
    },
    Native {
        name: "floor",
        func: NativeFn::Unary(floor),
    },
    Native {
        name: "ceil",
        func: NativeFn::Unary(ceil),
    },
    Native {
        name: "pow",
        func: NativeFn::Binary(pow),
    },
];

extern "C" fn sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn cos(x: f64) -> f64 {
    x.cos()
}

extern "C" fn tan(x: f64) -> f64 {
    x.tan()
}

extern "C" fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

extern "C" fn exp(x: f64) -> f64 {
    x.exp()
}

// natural log
extern "C" fn log(x: f64) -> f64 {
    x.ln()
}

extern "C" fn fabs(x: f64) -> f64 {
    x.abs()
}

extern "C" fn floor(x: f64) -> f64 {
    x.floor()
}

extern "C" fn ceil(x: f64) -> f64 {
    x.ceil()
}

extern "C" fn pow(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

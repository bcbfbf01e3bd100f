//! Source text fixtures.

pub const ZEUS_HELLO: &str = r#"extern fn puts(s: *u8): i32;

fn main(): i32 {
    puts("hello\n");
    return 0;
}
"#;

pub const ZEUS_STRUCTS: &str = r#"use geometry::shapes;

/* shapes and sizes */
struct Rect<T> {
    width: i32,
    height: i32,
    fn area(self: &Rect): i32 {
        return width * height;
    }
}

fn build(w: i32, h: i32): Rect {
    let r: Rect = Rect { width: w; height: h; };
    return r;
}
"#;

pub const ZEUS_CONTROL_FLOW: &str = r#"fn classify(n: i32): i32 {
    let mut total: i32 = 0;
    for i in 0..=n {
        if i % 2 == 0 {
            total = total + i;
        } else {
            continue;
        }
    }
    while total > 100 {
        total = total >> 1;
        break;
    }
    match total {
        0 => 1,
        1 | 2 | 3 => 2,
        x => 3,
    };
    return total;
}
"#;

pub const ZEUS_ARRAYS: &str = r#"fn sum(values: [i32; 4]): i64 {
    let mut acc: i64 = 0;
    acc = acc + values[1] as i64;
    return acc;
}
"#;

pub const ZEUS_BROKEN: &str = r#"fn main(: i32 {
    let x: i32 = ;
    return x
}

fn fine(): i32 {
    return 1;
}
"#;

pub const ZEUS_ALL: &[&str] = &[ZEUS_HELLO, ZEUS_STRUCTS, ZEUS_CONTROL_FLOW, ZEUS_ARRAYS, ZEUS_BROKEN];

pub const CALC_PROGRAM: &str = "x = 1 + 2 * 3;\n# comment\ny = (x - 4) / f(x, 2);\nz = 2 ^ 3 ^ 2;\n";

//! Integration tests for loading scripts and calling into them from a host

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use golf_script::{
    LoadErrorKind, NativeFn, Script, ScriptOptions, Scoping, Val, ValType, Vec3, check_args,
    loaded_scripts,
};
use std::cell::RefCell;
use std::rc::Rc;

const RING: &str = r#"
    // Points evenly spaced on a circle in the xz plane
    list generate(int segments, float radius, vec3 center) {
        list points = [];
        for (int i = 0; i < segments; i = i + 1) {
            float a = 2 * PI * i / segments;
            points[i] = center + V3(cos(a), 0, sin(a)) * radius;
        }
        return points;
    }
"#;

fn points(script: &Script, val: &Val) -> Vec<Vec3> {
    let Val::List(id) = val else {
        panic!("expected list, got {:?}", val);
    };
    script
        .heap()
        .list(*id)
        .expect("list should be live")
        .iter()
        .map(|v| match v {
            Val::Vec3(p) => *p,
            other => panic!("expected vec3, got {:?}", other),
        })
        .collect()
}

#[test]
fn generator_script_produces_points() {
    let mut script = Script::load("ring.gs", RING).expect("Script should load");
    let result = script
        .eval_fn(
            "generate",
            &[Val::Int(4), Val::Float(2.0), Val::Vec3(Vec3::new(0.0, 1.0, 0.0))],
        )
        .expect("generate should run");

    let pts = points(&script, &result);
    assert_eq!(pts.len(), 4);
    for p in &pts {
        assert_relative_eq!(p.y, 1.0);
        assert_relative_eq!(Vec3::new(p.x, 0.0, p.z).length(), 2.0, epsilon = 1e-5);
    }
    assert_relative_eq!(pts[0].x, 2.0, epsilon = 1e-5);
    assert_relative_eq!(pts[1].z, 2.0, epsilon = 1e-5);
}

#[test]
fn eval_fn_requires_exact_argument_types() {
    let mut script = Script::load("ring_types.gs", RING).unwrap();
    let err = script
        .eval_fn("generate", &[Val::Int(4), Val::Int(2), Val::Vec3(Vec3::ZERO)])
        .unwrap_err();
    assert_eq!(err.message, "argument 2 of 'generate' must be float, got int");

    let err = script.eval_fn("generate", &[Val::Int(4)]).unwrap_err();
    assert!(err.message.contains("expects 3 arguments"));

    assert!(script.eval_fn("nothing_here", &[]).is_err());
    assert!(script.eval_fn("PI", &[]).is_err());
}

#[test]
fn add_returns_an_int() {
    let mut script = Script::load("add.gs", "int add(int a, int b) { return a + b; }").unwrap();
    assert_eq!(
        script.eval_fn("add", &[Val::Int(2), Val::Int(3)]).unwrap(),
        Val::Int(5)
    );
}

#[test]
fn top_level_statements_run_at_load() {
    let script = Script::load(
        "top.gs",
        "float f = (float)3; vec2 v = V2(1, 2) + V2(3, 4); int n = 7 / 2; float m = 7 / 2.0;",
    )
    .unwrap();
    assert_eq!(script.get_val("f"), Some(Val::Float(3.0)));
    assert_eq!(
        script.get_val("v"),
        Some(Val::Vec2(golf_script::Vec2::new(4.0, 6.0)))
    );
    assert_eq!(script.get_val("n"), Some(Val::Int(3)));
    assert_eq!(script.get_val("m"), Some(Val::Float(3.5)));
    assert_eq!(script.get_val("undeclared"), None);
}

#[test]
fn load_errors_carry_kind_and_position() {
    let err = Script::load("bad_parse.gs", "int x = ;").unwrap_err();
    assert_eq!(err.kind, LoadErrorKind::Parse);
    assert_eq!((err.line, err.col), (1, 9));
    assert!(err.to_string().starts_with("bad_parse.gs:1:9: "));

    let err = Script::load("bad_lex.gs", "int x = 1;\n  int y = @;").unwrap_err();
    assert_eq!(err.kind, LoadErrorKind::Lex);
    assert_eq!((err.line, err.col), (2, 11));

    let err = Script::load("bad_run.gs", "int x = 1;\nint x = 2;").unwrap_err();
    assert_eq!(err.kind, LoadErrorKind::Runtime);
    assert_eq!(err.line, 2);
}

#[test]
fn errors_in_calls_leave_the_script_usable() {
    let mut script = Script::load(
        "faulty.gs",
        "int count = 0;
         int bump() { count = count + 1; return count; }
         int broken() { return count + nope; }",
    )
    .unwrap();
    assert_eq!(script.eval_fn("bump", &[]).unwrap(), Val::Int(1));
    assert!(script.eval_fn("broken", &[]).is_err());
    assert_eq!(script.eval_fn("bump", &[]).unwrap(), Val::Int(2));
}

#[test]
fn host_natives_are_callable_from_script_functions() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut script = Script::load(
        "emit.gs",
        "void generate() { for (int i = 0; i < 3; i = i + 1) emit(V3(i, 0, 0)); }",
    )
    .unwrap();

    let sink = Rc::clone(&seen);
    script.set_native_fn("emit", move |_, args| {
        let args = check_args("emit", args, &[ValType::Vec3])?;
        if let [Val::Vec3(p)] = args.as_slice() {
            sink.borrow_mut().push(*p);
        }
        Ok(Val::Void)
    });

    assert_eq!(script.eval_fn("generate", &[]).unwrap(), Val::Void);
    assert_eq!(
        *seen.borrow(),
        vec![Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)]
    );
}

#[test]
fn host_natives_can_build_lists() {
    let mut script = Script::load(
        "corners.gs",
        "int count() { list c = corners(); return c.length; }",
    )
    .unwrap();
    script.set_native_fn("corners", |heap, _| {
        Ok(heap.new_list(vec![Val::Vec2(golf_script::Vec2::ZERO); 4]))
    });
    assert_eq!(script.eval_fn("count", &[]).unwrap(), Val::Int(4));
}

#[test]
fn scoping_is_configurable() {
    let src = "int depth() { return level; }
               int outer() { int level = 2; return depth(); }";

    let mut lexical = Script::load("lexical.gs", src).unwrap();
    assert_eq!(lexical.scoping(), Scoping::Lexical);
    assert!(lexical.eval_fn("outer", &[]).is_err());

    let options = ScriptOptions::default().with_scoping(Scoping::Dynamic);
    let mut dynamic = Script::load_with_options("dynamic.gs", src, options).unwrap();
    assert_eq!(dynamic.eval_fn("outer", &[]).unwrap(), Val::Int(2));
}

#[test]
fn options_can_preinstall_natives() {
    let options = ScriptOptions::default().with_native(NativeFn::new("seed", |_, _| {
        Ok(Val::Int(42))
    }));
    let script = Script::load_with_options("seeded.gs", "int s = seed() + 1;", options).unwrap();
    assert_eq!(script.get_val("s"), Some(Val::Int(43)));
}

#[test]
fn registry_lists_live_scripts() {
    let a = Script::load("registry_one.gs", "int a = 1;").unwrap();
    let b = Script::load("registry_two.gs", "int b = 2;").unwrap();
    let live = loaded_scripts();
    assert!(live.iter().any(|e| e.id == a.id()));
    assert!(live.iter().any(|e| e.id == b.id()));
    assert_ne!(a.id(), b.id());

    drop(a);
    let live = loaded_scripts();
    assert!(!live.iter().any(|e| e.path.ends_with("registry_one.gs")));
    assert!(live.iter().any(|e| e.id == b.id()));
}

#[test]
fn print_formats_values() {
    let mut script = Script::load("show.gs", "list l = [1, 2.5, V2(1, 2), \"hi\"];").unwrap();
    let l = script.get_val("l").unwrap();
    assert_eq!(
        script.display(&l),
        "[1, 2.500000, <1.000000, 2.000000>, hi]"
    );
    assert_eq!(
        script.eval_source("print(1, true);").unwrap(),
        Some(Val::Void)
    );
}

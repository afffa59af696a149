use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsrt::{Context, Value};

fn bench_int_loop(c: &mut Criterion) {
    c.bench_function("int add 10k", |b| {
        let mut ctx = Context::new();
        b.iter(|| {
            let mut sum = Value::Int(0);
            let mut i = Value::Int(0);
            while ctx.lt(i, Value::Int(10000)).unwrap() {
                sum = ctx.add(sum, i).unwrap();
                i = ctx.add_int(i, Value::Int(1)).unwrap();
            }
            black_box(sum)
        })
    });
}

fn bench_float_mix(c: &mut Criterion) {
    c.bench_function("float mul/div 10k", |b| {
        let mut ctx = Context::new();
        b.iter(|| {
            let mut acc = Value::Float(1.0);
            for i in 1..10000 {
                acc = ctx.mul(acc, Value::Float(1.0001)).unwrap();
                acc = ctx.div(acc, Value::Int(i % 7 + 1)).unwrap();
                acc = ctx.mul(acc, Value::Int(i % 7 + 1)).unwrap();
            }
            black_box(acc)
        })
    });
}

fn bench_string_concat(c: &mut Criterion) {
    c.bench_function("string concat 1k", |b| {
        b.iter(|| {
            let mut ctx = Context::new();
            let mut s = ctx.new_str("");
            for i in 0..1000 {
                s = ctx.add(s, Value::Int(i % 10)).unwrap();
            }
            black_box(s)
        })
    });
}

fn bench_object_props(c: &mut Criterion) {
    c.bench_function("object set/get 64 keys", |b| {
        b.iter(|| {
            let mut ctx = Context::new();
            let obj = ctx.new_plain_object();
            let keys: Vec<Value> = (0..64).map(|i| ctx.new_str(&format!("k{}", i))).collect();
            for (i, &k) in keys.iter().enumerate() {
                ctx.set_prop(obj, k, Value::Int(i as i32)).unwrap();
            }
            let mut sum = Value::Int(0);
            for &k in &keys {
                let v = ctx.get_prop(obj, k).unwrap();
                sum = ctx.add(sum, v).unwrap();
            }
            black_box(sum)
        })
    });
}

fn bench_inherited_read(c: &mut Criterion) {
    c.bench_function("prototype chain read 10k", |b| {
        let mut ctx = Context::new();
        let base = ctx.new_plain_object();
        let key = ctx.new_str("shared");
        ctx.set_prop(base, key, Value::Int(1)).unwrap();
        let mut obj = base;
        for _ in 0..8 {
            let child = ctx.new_plain_object();
            ctx.set_proto(child, obj).unwrap();
            obj = child;
        }
        b.iter(|| {
            for _ in 0..10000 {
                black_box(ctx.get_prop(obj, key).unwrap());
            }
        })
    });
}

fn bench_array_push(c: &mut Criterion) {
    c.bench_function("array push 10k", |b| {
        b.iter(|| {
            let mut ctx = Context::new();
            let arr = ctx.new_plain_array();
            for i in 0..10000 {
                let len = ctx.get_prop_length(arr).unwrap();
                ctx.set_prop_elem(arr, len, Value::Int(i)).unwrap();
            }
            black_box(ctx.get_prop_length(arr).unwrap())
        })
    });
}

fn bench_enumerate(c: &mut Criterion) {
    c.bench_function("for-in 32 keys", |b| {
        let mut ctx = Context::new();
        let obj = ctx.new_plain_object();
        for i in 0..32 {
            let k = ctx.new_str(&format!("p{}", i));
            ctx.set_prop(obj, k, Value::Int(i)).unwrap();
        }
        b.iter(|| {
            let mut e = ctx.prop_enum(obj);
            let mut n = 0;
            while e.next(&mut ctx).unwrap().is_some() {
                n += 1;
            }
            black_box(n)
        })
    });
}

criterion_group!(
    benches,
    bench_int_loop,
    bench_float_mix,
    bench_string_concat,
    bench_object_props,
    bench_inherited_read,
    bench_array_push,
    bench_enumerate,
);
criterion_main!(benches);

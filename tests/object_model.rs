use jsrt::gc::{CollectReason, CollectRequest, Collector, Heap};
use jsrt::{Context, RuntimeConfig, Value};
use std::cell::RefCell;
use std::rc::Rc;

fn key(ctx: &mut Context, s: &str) -> Value {
    ctx.new_str(s)
}

fn enum_keys(ctx: &mut Context, v: Value) -> Vec<Value> {
    let mut e = ctx.prop_enum(v);
    let mut out = Vec::new();
    while let Some(k) = e.next(ctx).unwrap() {
        out.push(k);
    }
    out
}

#[test]
fn growth_keeps_every_key_and_forwards_old_handles() {
    let mut ctx = Context::new();
    let obj = ctx.new_plain_object();
    let Value::Object(before) = obj else {
        unreachable!()
    };
    let cap_before = ctx.heap().capacity(before);

    let keys: Vec<Value> = (0..40).map(|i| key(&mut ctx, &format!("key{}", i))).collect();
    for (i, &k) in keys.iter().enumerate() {
        ctx.set_prop(obj, k, Value::Int(i as i32 * 3)).unwrap();
    }

    // at least two growths: the handle now forwards through a chain
    let first = ctx.heap().next(before).expect("grown at least once");
    assert!(ctx.heap().next(first).is_some());
    let live = ctx.heap().resolve(before);
    assert!(ctx.heap().capacity(live) > cap_before);

    for (i, &k) in keys.iter().enumerate() {
        assert_eq!(ctx.get_prop(obj, k).unwrap(), Value::Int(i as i32 * 3));
        assert_eq!(ctx.get_prop(Value::Object(live), k).unwrap(), Value::Int(i as i32 * 3));
    }
    assert!(ctx.se(obj, Value::Object(live)));
}

#[test]
fn array_zero_then_thousand() {
    let mut ctx = Context::new();
    let arr = ctx.new_plain_array();
    ctx.set_prop(arr, Value::Int(0), Value::Int(1)).unwrap();
    ctx.set_prop(arr, Value::Int(1000), Value::Int(2)).unwrap();

    let Value::Array(r) = arr else { unreachable!() };
    assert!(ctx.heap().arr_capacity(r) >= 1001);
    assert_eq!(ctx.get_prop_length(arr).unwrap(), Value::Int(1001));
    for i in 2..1000 {
        assert_eq!(ctx.get_prop(arr, Value::Int(i)).unwrap(), Value::Undefined);
    }
    assert_eq!(ctx.get_prop(arr, Value::Int(0)).unwrap(), Value::Int(1));
    assert_eq!(ctx.get_prop(arr, Value::Int(1000)).unwrap(), Value::Int(2));
}

#[test]
fn array_length_shrink_keeps_capacity() {
    let mut ctx = Context::new();
    let arr = ctx.new_plain_array();
    for i in 0..10 {
        ctx.set_prop(arr, Value::Int(i), Value::Int(i)).unwrap();
    }
    let Value::Array(r) = arr else { unreachable!() };
    let cap = ctx.heap().arr_capacity(r);
    let len = key(&mut ctx, "length");
    ctx.set_prop(arr, len, Value::Int(2)).unwrap();
    assert_eq!(ctx.heap().arr_capacity(r), cap);
    ctx.set_prop(arr, len, Value::Int(5)).unwrap();
    assert_eq!(ctx.get_prop(arr, Value::Int(4)).unwrap(), Value::Undefined);
}

#[test]
fn shadowed_key_enumerated_once() {
    let mut ctx = Context::new();
    let x = key(&mut ctx, "x");
    let a = ctx.new_plain_object();
    ctx.set_prop(a, x, Value::Int(1)).unwrap();
    let b = ctx.new_plain_object();
    ctx.set_proto(b, a).unwrap();
    ctx.set_prop(b, x, Value::Int(2)).unwrap();

    assert_eq!(enum_keys(&mut ctx, b), vec![x]);
    assert_eq!(ctx.get_prop(b, x).unwrap(), Value::Int(2));
}

#[test]
fn delete_then_readd_reuses_slot() {
    let mut ctx = Context::new();
    let k = key(&mut ctx, "k");
    let proto = ctx.new_plain_object();
    ctx.set_prop(proto, k, Value::Int(100)).unwrap();
    let obj = ctx.new_plain_object();
    ctx.set_proto(obj, proto).unwrap();
    ctx.set_prop(obj, k, Value::Int(1)).unwrap();

    let Value::Object(r) = obj else { unreachable!() };
    let Value::Str(name) = k else { unreachable!() };
    let map = ctx.heap().obj_map(r);
    let slot = ctx.heap().map(map).find(name).unwrap();
    let props = ctx.heap().map(map).num_props();

    assert!(ctx.del_prop(obj, k).unwrap());
    assert!(!ctx.has_own_prop(obj, k).unwrap());
    assert_eq!(ctx.get_prop(obj, k).unwrap(), Value::Int(100));
    assert!(ctx.raw_slot(r, slot).unwrap().is_missing());

    ctx.set_prop(obj, k, Value::Int(2)).unwrap();
    assert_eq!(ctx.heap().map(map).find(name), Some(slot));
    assert_eq!(ctx.heap().map(map).num_props(), props);
    assert_eq!(ctx.get_prop(obj, k).unwrap(), Value::Int(2));
}

#[test]
fn writing_undefined_keeps_property_present() {
    let mut ctx = Context::new();
    let obj = ctx.new_plain_object();
    let k = key(&mut ctx, "k");
    ctx.set_prop(obj, k, Value::Undefined).unwrap();
    assert!(ctx.has_own_prop(obj, k).unwrap());
    let Value::Object(r) = obj else { unreachable!() };
    let raw = ctx.raw_slot(r, 1).unwrap();
    assert!(!raw.is_missing());
    assert_eq!(raw.to_value(), Some(Value::Undefined));
}

#[test]
fn loose_and_strict_equality_diverge() {
    let mut ctx = Context::new();
    assert!(!ctx.eq(Value::Int(0), Value::Null).unwrap());
    assert!(ctx.eq(Value::Bool(false), Value::Null).unwrap());
    assert!(ctx.eq(Value::Float(0.0), Value::Null).unwrap());
    assert!(ctx.eq(Value::Undefined, Value::Null).unwrap());
    assert!(!ctx.se(Value::Undefined, Value::Null));
    assert!(ctx.ns(Value::Undefined, Value::Null));
    assert!(ctx.eq_null(Value::Undefined));
    assert!(!ctx.eq_null(Value::Int(0)));

    let one = key(&mut ctx, "1");
    assert!(ctx.eq(one, Value::Int(1)).unwrap());
    assert!(!ctx.se(one, Value::Int(1)));
    assert!(ctx.se(Value::Int(1), Value::Float(1.0)));
    assert!(!ctx.se(Value::Float(f64::NAN), Value::Float(f64::NAN)));
}

#[test]
fn instanceof_and_in_walk_the_chain() {
    let mut ctx = Context::new();
    let global = ctx.global_value();
    let name = key(&mut ctx, "Object");
    let object_ctor = ctx.get_prop(global, name).unwrap();
    let obj = ctx.new_plain_object();
    assert!(ctx.instanceof(obj, object_ctor).unwrap());

    let to_string = key(&mut ctx, "toString");
    assert!(ctx.in_op(to_string, obj).unwrap());
    let missing = key(&mut ctx, "missing");
    assert!(!ctx.in_op(missing, obj).unwrap());
    assert!(ctx.in_op(missing, Value::Null).unwrap_err().is_type_error());
}

#[test]
fn closure_cells_are_shared() {
    let mut ctx = Context::new();
    let cell = ctx.heap_mut().make_cell();
    ctx.heap_mut().set_cell_val(cell, Value::Int(7));

    fn noop(_: &mut Context, _: Value, _: &[Value]) -> jsrt::JsResult<Value> {
        Ok(Value::Undefined)
    }
    let f = ctx.new_native_function(noop);
    let g = ctx.new_native_function(noop);
    let (Value::Closure(f), Value::Closure(g)) = (f, g) else {
        unreachable!()
    };
    ctx.heap_mut().clos_set_cell(f, 0, cell).unwrap_err();

    let map = ctx.new_map();
    let proto = Value::Object(ctx.function_prototype());
    let h = ctx.new_closure(map, proto, jsrt::runtime::Function::Native(noop), 1);
    let k = ctx.new_closure(map, proto, jsrt::runtime::Function::Native(noop), 1);
    let (Value::Closure(h), Value::Closure(k)) = (h, k) else {
        unreachable!()
    };
    ctx.heap_mut().clos_set_cell(h, 0, cell).unwrap();
    ctx.heap_mut().clos_set_cell(k, 0, cell).unwrap();
    let via_h = ctx.heap().clos_get_cell(h, 0).unwrap();
    ctx.heap_mut().set_cell_val(via_h, Value::Int(8));
    let via_k = ctx.heap().clos_get_cell(k, 0).unwrap();
    assert_eq!(ctx.heap().get_cell_val(via_k), Value::Int(8));
    assert_eq!(ctx.heap().num_cells(g), 0);
}

#[derive(Clone, Default)]
struct Recording(Rc<RefCell<Vec<CollectRequest>>>);

impl Collector for Recording {
    fn collect(&mut self, heap: &mut Heap, request: CollectRequest) {
        if let Some(size) = request.target_size {
            heap.set_heap_size(size);
        }
        self.0.borrow_mut().push(request);
    }
}

#[test]
fn global_growth_and_shrink_issue_requests() {
    let log = Recording::default();
    let mut ctx = Context::with_collector(RuntimeConfig::default(), Box::new(log.clone()));
    let global = ctx.global_value();
    for i in 0..64 {
        let k = key(&mut ctx, &format!("g{}", i));
        ctx.set_prop(global, k, Value::Int(i)).unwrap();
    }
    assert!(
        log.0
            .borrow()
            .iter()
            .any(|r| r.reason == CollectReason::GlobalGrowth)
    );
    // the context follows the global to its new instance
    let g0 = key(&mut ctx, "g0");
    let now = ctx.global_value();
    assert_eq!(ctx.get_prop(now, g0).unwrap(), Value::Int(0));

    assert!(ctx.shrink_heap(0).unwrap_err().is_range_error());
    log.0.borrow_mut().clear();
    ctx.shrink_heap(16).unwrap();
    let requests = log.0.borrow();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.reason == CollectReason::ShrinkHeap));
    assert!(requests[1].target_size.is_some());
}

#![allow(dead_code)]

use std::sync::Arc;

use canister::{Inject, Lifetime, RegistryBuilder};
use criterion::{criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("get_singleton_single", |b| {
        struct A;

        let container = RegistryBuilder::new()
            .provide(|| Ok(A), Lifetime::Singleton)
            .build()
            .unwrap();
        b.iter(|| container.get::<A>().unwrap());
    })
    .bench_function("get_singleton_chain", |b| {
        struct A(Arc<B>, Arc<C>);
        struct B(i32);
        struct C(Arc<CA>);
        struct CA(Arc<CAA>);
        struct CAA(Arc<CAAA>);
        struct CAAA;

        let container = RegistryBuilder::new()
            .provide(|| Ok(CAAA), Lifetime::Singleton)
            .provide(|Inject(caaa): Inject<CAAA>| Ok(CAA(caaa)), Lifetime::Singleton)
            .provide(|Inject(caa): Inject<CAA>| Ok(CA(caa)), Lifetime::Singleton)
            .provide(|Inject(ca): Inject<CA>| Ok(C(ca)), Lifetime::Singleton)
            .provide(|| Ok(B(2)), Lifetime::Singleton)
            .provide(
                |Inject(b): Inject<B>, Inject(c): Inject<C>| Ok(A(b, c)),
                Lifetime::Singleton,
            )
            .build()
            .unwrap();
        b.iter(|| container.get::<A>().unwrap());
    })
    .bench_function("get_scoped_single", |b| {
        struct A;

        let container = RegistryBuilder::new()
            .provide(|| Ok(A), Lifetime::Scoped)
            .build()
            .unwrap();
        let scope = container.scope();
        b.iter(|| scope.get::<A>().unwrap());
    })
    .bench_function("get_transient_chain", |b| {
        struct A(Arc<B>, Arc<C>);
        struct B(i32);
        struct C(Arc<CA>);
        struct CA(Arc<CAA>);
        struct CAA(Arc<CAAA>);
        struct CAAA;

        let container = RegistryBuilder::new()
            .provide(|| Ok(CAAA), Lifetime::Transient)
            .provide(|Inject(caaa): Inject<CAAA>| Ok(CAA(caaa)), Lifetime::Transient)
            .provide(|Inject(caa): Inject<CAA>| Ok(CA(caa)), Lifetime::Transient)
            .provide(|Inject(ca): Inject<CA>| Ok(C(ca)), Lifetime::Transient)
            .provide(|| Ok(B(2)), Lifetime::Transient)
            .provide(
                |Inject(b): Inject<B>, Inject(c): Inject<C>| Ok(A(b, c)),
                Lifetime::Transient,
            )
            .build()
            .unwrap();
        b.iter(|| container.get::<A>().unwrap());
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

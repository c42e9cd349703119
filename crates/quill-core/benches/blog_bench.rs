//! Benchmarks for listing and validation.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quill_core::{Actor, Blog, PostInput, Timestamp};
use serde_json::json;
use std::hint::black_box;

fn at(secs: i64) -> Timestamp {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// A blog with `posts` posts by two authors, three comments each.
fn seeded(posts: usize) -> Blog {
    let mut blog = Blog::in_memory();
    let alice = blog.register_user("alice", "", "pw", "salt").unwrap().id;
    let bob = blog.register_user("bob", "", "pw", "salt").unwrap().id;

    for i in 0..posts {
        let author = if i % 2 == 0 { alice } else { bob };
        let secs = i as i64 * 10;
        let post = blog
            .create_post(
                Actor::user(author),
                json!({"title": format!("Post {i}"), "content": "Some post content"}),
                at(secs),
            )
            .unwrap();
        for j in 0..3 {
            blog.create_comment(
                Actor::user(if j % 2 == 0 { bob } else { alice }),
                post.id,
                json!({"content": format!("Comment {j}")}),
                at(secs + j + 1),
            )
            .unwrap();
        }
    }
    blog
}

fn bench_list_posts(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_posts");
    for size in [10, 100, 1000] {
        let blog = seeded(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &blog, |b, blog| {
            b.iter(|| black_box(blog.list_posts().unwrap()));
        });
    }
    group.finish();
}

fn bench_post_detail(c: &mut Criterion) {
    let blog = seeded(100);
    let id = blog.list_posts().unwrap()[50].id;
    c.bench_function("post_detail", |b| {
        b.iter(|| black_box(blog.post_detail(black_box(id)).unwrap()));
    });
}

fn bench_validation(c: &mut Criterion) {
    let valid = json!({"title": "  A reasonable title ", "content": "Body of the post", "author": 9});
    let invalid = json!({"title": "A", "content": null});

    let mut group = c.benchmark_group("post_input");
    group.bench_function("valid", |b| {
        b.iter(|| black_box(PostInput::parse(black_box(&valid)).is_ok()));
    });
    group.bench_function("invalid", |b| {
        b.iter(|| black_box(PostInput::parse(black_box(&invalid)).is_err()));
    });
    group.finish();
}

criterion_group!(benches, bench_list_posts, bench_post_detail, bench_validation);
criterion_main!(benches);

//! Benchmarks for the sockpipe relay.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

use sockpipe_core::io::{Relay, StreamEndpoint};

async fn echo_through_relay(data: &[u8], read_chunk: usize, soft_limit: usize) -> Vec<u8> {
    let size = data.len();
    let (client, server_side) = duplex(size * 2);
    let (target_side, target) = duplex(size * 2);

    let relay = Relay::builder()
        .local(StreamEndpoint::with_limits(server_side, "client", read_chunk, soft_limit))
        .remote(StreamEndpoint::with_limits(target_side, "target", read_chunk, soft_limit))
        .build()
        .unwrap();
    let relay_handle = tokio::spawn(relay.run());

    let (mut client_r, mut client_w) = tokio::io::split(client);
    let (mut target_r, mut target_w) = tokio::io::split(target);

    // Client -> Target
    let payload = data.to_vec();
    let send_handle = tokio::spawn(async move {
        client_w.write_all(&payload).await.unwrap();
        client_w
    });

    // Target reads and responds
    let mut buf = vec![0u8; size];
    target_r.read_exact(&mut buf).await.unwrap();
    target_w.write_all(&buf).await.unwrap();

    // Client reads response
    client_r.read_exact(&mut buf).await.unwrap();

    let mut client_w = send_handle.await.unwrap();
    client_w.shutdown().await.unwrap();
    relay_handle.await.unwrap();
    buf
}

fn bench_relay_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("relay_throughput");

    for data_size in [1024, 8192, 65536] {
        group.throughput(Throughput::Bytes(data_size as u64 * 2)); // bidirectional
        group.bench_with_input(
            BenchmarkId::from_parameter(data_size),
            &data_size,
            |b, &size| {
                let data = vec![b'x'; size];
                b.iter(|| rt.block_on(async { black_box(echo_through_relay(&data, 8192, 16384).await) }))
            },
        );
    }

    group.finish();
}

fn bench_relay_soft_limits(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("relay_soft_limit");

    let data = vec![b'x'; 32768];

    // Smaller limits mean more pause/drain cycles.
    for soft_limit in [1024, 4096, 16384, 65536] {
        group.bench_with_input(
            BenchmarkId::from_parameter(soft_limit),
            &soft_limit,
            |b, &limit| {
                b.iter(|| rt.block_on(async { black_box(echo_through_relay(&data, 8192, limit).await) }))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_relay_throughput, bench_relay_soft_limits);

criterion_main!(benches);

pub mod bench;

pub use bench::{
    BenchmarkConfig, DEFAULT_PAYLOAD_LEN, DEFAULT_TIMEOUT, Protocol, Scheme, Target, TcpFraming,
    filled_payload,
};

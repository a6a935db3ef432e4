fn main() {
    tonic_build::compile_protos("src/grpc/proto/core.proto")
        .unwrap_or_else(|e| panic!("failed to compile protos {:?}", e));
}

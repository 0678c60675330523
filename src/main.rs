fn main() -> Result<(), Box<dyn std::error::Error>> {
    trace_filter::run()
}

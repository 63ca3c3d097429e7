mod backpressure_test;
mod cache_test;
mod fetch_test;
mod pipeline_test;

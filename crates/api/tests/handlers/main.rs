mod middleware_test;
mod schedule_test;
mod test_utils;

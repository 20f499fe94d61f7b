pub mod continuous_casting;

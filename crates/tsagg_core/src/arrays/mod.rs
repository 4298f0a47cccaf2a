pub mod bitmap;
pub mod builder;
pub mod column;
pub mod datatype;
pub mod scalar;
pub mod testutil;

mod texture;
pub use texture::*;

mod shader;
pub use shader::*;

mod material;
pub use material::*;

mod font;
pub use font::*;

mod script;
pub use script::*;

mod mesh;
pub use mesh::*;

mod untyped;
pub use untyped::*;

use std::fmt::{Display, Formatter};

// Byte counts printed with binary (1024) prefixes
pub struct FormatBinary
{
    pub bytes: f64
}
#[allow(non_upper_case_globals)]
impl FormatBinary
{
    pub const Ki: f64 = 1.0 * 1024.0; // Kibi (Ki)
    pub const Mi: f64 = Self::Ki * 1024.0; // Mebi (Mi)
    pub const Gi: f64 = Self::Mi * 1024.0; // Gibi (Gi)
}
impl Display for FormatBinary
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        let div =
        {
            if self.bytes > Self::Gi
            {
                (self.bytes / Self::Gi, "Gi")
            }
            else if self.bytes > Self::Mi
            {
                (self.bytes / Self::Mi, "Mi")
            }
            else if self.bytes > Self::Ki
            {
                (self.bytes / Self::Ki, "Ki")
            }
            else
            {
                (self.bytes, "")
            }
        };
        Display::fmt(&div.0, f)?;
        if f.alternate() { f.write_str(" ")?; }
        f.write_str(div.1)
    }
}
#[macro_export]
macro_rules! format_binary
{
    ($val:expr) => { $crate::utils::FormatBinary { bytes: $val as f64 } };
}

pub trait ShortTypeName
{
    fn short_type_name() -> &'static str;
}
impl<T: ?Sized> ShortTypeName for T
{
    #[inline]
    fn short_type_name() -> &'static str
    {
        let type_name = std::any::type_name::<T>();
        // strip generic args before looking for the last path segment
        let base = match type_name.find('<')
        {
            None => type_name,
            Some(i) => &type_name[..i],
        };
        match base.rfind(':')
        {
            None => base,
            Some(i) => &base[(i + 1)..]
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    mod format_binary
    {
        use super::*;

        #[test]
        fn values()
        {
            assert_eq!("123", format!("{}", format_binary!(123.0)));
            assert_eq!("123Ki", format!("{}", format_binary!(123.0 * FormatBinary::Ki)));
            assert_eq!("123Mi", format!("{}", format_binary!(123.0 * FormatBinary::Mi)));
            assert_eq!("123Gi", format!("{}", format_binary!(123.0 * FormatBinary::Gi)));
        }

        #[test]
        fn alternate_spacing()
        {
            assert_eq!("2 Ki", format!("{:#}", format_binary!(2048)));
        }

        #[test]
        fn decimals()
        {
            assert_eq!("123.50Mi", format!("{:.2}", format_binary!(123.0 * FormatBinary::Mi + (FormatBinary::Mi / 2.0))));
        }
    }

    mod short_type_name
    {
        use super::*;

        struct Plain;
        struct Wrapped<T>(T);

        #[test]
        fn strips_module_path()
        {
            assert_eq!("Plain", Plain::short_type_name());
            assert_eq!("u32", u32::short_type_name());
        }

        #[test]
        fn strips_generics()
        {
            assert_eq!("Wrapped", Wrapped::<Plain>::short_type_name());
        }
    }
}

/// Register the listed model types with the process-wide registry before
/// the first ABI call, from a module constructor.
///
/// Each type must implement [`crate::UserModel`] (usually via
/// `#[derive(FmuModel)]`). Registration failures are reported on stderr;
/// they never surface on the FMI ABI.
///
/// ```rust,ignore
/// export_models! { BouncingBall, Thermostat }
/// ```
#[macro_export]
macro_rules! export_models {
    ($($model:ty),+ $(,)?) => {
        #[$crate::ctor::ctor]
        fn __fmu_register_models() {
            $(
                if let Err(err) =
                    $crate::register_model($crate::ModelDefinition::<$model>::new())
                {
                    eprintln!(
                        "failed to register model {}: {err}",
                        stringify!($model)
                    );
                }
            )+
        }
    };
}

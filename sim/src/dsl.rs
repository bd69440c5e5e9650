/// This macro helps defining a set of functional units composing a datapath.
///
/// During a cycle,
/// 1. Registers hold the values latched at the previous clock edge.
/// 2. Signals start from the register outputs, go through wires and
///    combinational logics, finally reach the inputs of functional units.
/// 3. On receiving input signals, a functional unit processes them and updates
///    its output signals, which feed the next combinational logics.
/// 4. After all signals reach their destinations, the values driven into the
///    registers are latched at the next clock edge.
///
/// Registers are not units. They live in the architecture's register snapshot
/// and are written by combinational logics only.
#[macro_export]
macro_rules! define_units {
    ($(
        $(#[$att:meta])*
        $unit_name:ident $unit_short_name:ident {
            $(.input( $($(#[$input_att:meta])* $iname:ident : $itype:ty),* ))?
            $(.output( $($(#[$output_att:meta])* $oname:ident : $otype:ty),* ))?
            $($sname:ident : $stype:ty),* $(,)?
        } $body:block
    )*) => {
        /// Input signals of units
        pub mod unit_in {
            #![allow(unused_imports)]
            use super::*;
            $(#[derive(Default, Debug, Clone)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize))]
            pub struct $unit_name {
                $($($(#[$input_att])* pub $iname: $itype, )*)?
            })*
        }
        /// Output signals of units
        pub mod unit_out {
            #![allow(unused_imports)]
            use super::*;
            $(#[derive(Default, Debug, Clone)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize))]
            pub struct $unit_name {
                $($($(#[$output_att])* pub $oname: $otype, )*)?
            })*
        }
        #[derive(Default, Debug, Clone)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct UnitInputSignal {
            $(pub $unit_short_name: unit_in::$unit_name),*
        }
        #[derive(Default, Debug, Clone)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct UnitOutputSignal {
            $(pub $unit_short_name: unit_out::$unit_name),*
        }

        $(
        $(#[$att])*
        #[derive(Default, Debug)]
        pub struct $unit_name {
            $(pub $sname: $stype ),*
        }

        impl $unit_name {
            /// Evaluate this unit from its input signals.
            #[allow(unused_variables)]
            pub fn trigger(
                &mut self,
                inputs: unit_in::$unit_name,
                outputs: &mut unit_out::$unit_name,
            ) {
                let Self { $( $sname, )* } = self;
                let unit_in::$unit_name { $($( $iname, )*)? } = inputs;
                let unit_out::$unit_name { $($( $oname, )*)? } = outputs;
                $body
            }
        }
        )*

        #[derive(Default, Debug)]
        pub struct Units {
            $( pub $unit_short_name: $unit_name, )*
        }

        impl $crate::framework::HardwareUnits for Units {
            type UnitIn = UnitInputSignal;
            type UnitOut = UnitOutputSignal;

            fn run_unit(
                &mut self,
                name: &'static str,
                input: &UnitInputSignal,
                output: &mut UnitOutputSignal,
            ) {
                match name {
                    $( stringify!($unit_short_name) => self
                        .$unit_short_name
                        .trigger(input.$unit_short_name.clone(), &mut output.$unit_short_name),
                    )*
                    _ => panic!("invalid unit name `{name}`"),
                }
            }
        }

        /// This function adds all unit nodes, input ports and output ports to
        /// the graph builder.
        pub fn hardware_setup(builder: &mut $crate::framework::PropOrderBuilder) {
            $(
            builder.add_unit_node(stringify!($unit_short_name));
            $( $( builder.add_unit_input(stringify!($unit_short_name), stringify!($iname)); )* )?
            $( $( builder.add_unit_output(stringify!($unit_short_name), stringify!($oname)); )* )?
            )*
        }
    };
}

/// Define a multiplexer select signal. The `X` constant names the encoding
/// driven when the select is a don't-care.
#[macro_export]
macro_rules! define_sel {
    {
        $(#[$att:meta])*
        $name:ident {
            $( $(#[$vatt:meta])* $variant:ident = $code:expr, )*
        }
        X = $x:ident;
    } => {
        $(#[$att])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub enum $name {
            #[default]
            $( $(#[$vatt])* $variant = $code, )*
        }

        impl $name {
            /// The don't-care encoding.
            pub const X: Self = Self::$x;

            pub fn name_of(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name_of())
            }
        }
    };
}

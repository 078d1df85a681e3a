// rsas - an interpreter for a subset of the SAS language.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! The procedure steps: SORT, PRINT, MEANS, FREQ.

mod freq;
mod means;
mod print;
mod sort;

use crate::{
    ast::ProcStep,
    engine::{Engine, StepError},
};

pub(crate) fn run(engine: &mut Engine, step: &ProcStep) -> Result<(), StepError> {
    match step {
        ProcStep::Sort(proc) => sort::run(engine, proc),
        ProcStep::Print(proc) => print::run(engine, proc),
        ProcStep::Means(proc) => means::run(engine, proc),
        ProcStep::Freq(proc) => freq::run(engine, proc),
    }
}

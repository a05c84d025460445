pub mod city;
pub mod observation;

mod support;

mod forwarding;
mod packet;
mod queues;
mod sim_time;
mod simulator;

use alloy::sol;

sol! {
    #[sol(rpc)]
    contract MultiSendCallOnly {
        function multiSend(bytes memory transactions) external payable;
    }
}
